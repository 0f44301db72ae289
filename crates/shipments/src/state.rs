use core::str::FromStr;

use serde::{Deserialize, Serialize};

use envios_core::DomainError;

/// Shipment lifecycle state.
///
/// `Ingresada` is the initial state, `Entregado` is terminal, and
/// `NoEntregado` loops back to `AsignadoACourier` for another attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentState {
    Ingresada,
    #[serde(rename = "Asignado a courier")]
    AsignadoACourier,
    Entregado,
    #[serde(rename = "No entregado")]
    NoEntregado,
}

impl ShipmentState {
    pub const ALL: [ShipmentState; 4] = [
        ShipmentState::Ingresada,
        ShipmentState::AsignadoACourier,
        ShipmentState::Entregado,
        ShipmentState::NoEntregado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentState::Ingresada => "Ingresada",
            ShipmentState::AsignadoACourier => "Asignado a courier",
            ShipmentState::Entregado => "Entregado",
            ShipmentState::NoEntregado => "No entregado",
        }
    }
}

impl core::fmt::Display for ShipmentState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShipmentState::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation("estado", format!("'{s}' is not a shipment state")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for st in ShipmentState::ALL {
            assert_eq!(st.as_str().parse::<ShipmentState>().unwrap(), st);
            assert_eq!(serde_json::to_value(st).unwrap(), st.as_str());
        }
    }
}

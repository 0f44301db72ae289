//! Fixed catalogs served read-only to clients and re-validated on every write.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use envios_core::DomainError;

/// Uruguayan department (the 19 first-level administrative divisions).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    Artigas,
    Canelones,
    #[serde(rename = "Cerro Largo")]
    CerroLargo,
    Colonia,
    Durazno,
    Flores,
    Florida,
    Lavalleja,
    Maldonado,
    Montevideo,
    #[serde(rename = "Paysandú")]
    Paysandu,
    #[serde(rename = "Río Negro")]
    RioNegro,
    Rivera,
    Rocha,
    Salto,
    #[serde(rename = "San José")]
    SanJose,
    Soriano,
    #[serde(rename = "Tacuarembó")]
    Tacuarembo,
    #[serde(rename = "Treinta y Tres")]
    TreintaYTres,
}

impl Department {
    pub const ALL: [Department; 19] = [
        Department::Artigas,
        Department::Canelones,
        Department::CerroLargo,
        Department::Colonia,
        Department::Durazno,
        Department::Flores,
        Department::Florida,
        Department::Lavalleja,
        Department::Maldonado,
        Department::Montevideo,
        Department::Paysandu,
        Department::RioNegro,
        Department::Rivera,
        Department::Rocha,
        Department::Salto,
        Department::SanJose,
        Department::Soriano,
        Department::Tacuarembo,
        Department::TreintaYTres,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Artigas => "Artigas",
            Department::Canelones => "Canelones",
            Department::CerroLargo => "Cerro Largo",
            Department::Colonia => "Colonia",
            Department::Durazno => "Durazno",
            Department::Flores => "Flores",
            Department::Florida => "Florida",
            Department::Lavalleja => "Lavalleja",
            Department::Maldonado => "Maldonado",
            Department::Montevideo => "Montevideo",
            Department::Paysandu => "Paysandú",
            Department::RioNegro => "Río Negro",
            Department::Rivera => "Rivera",
            Department::Rocha => "Rocha",
            Department::Salto => "Salto",
            Department::SanJose => "San José",
            Department::Soriano => "Soriano",
            Department::Tacuarembo => "Tacuarembó",
            Department::TreintaYTres => "Treinta y Tres",
        }
    }
}

impl core::fmt::Display for Department {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation("departamento", format!("'{s}' is not a department of Uruguay")))
    }
}

/// Reason for the shipment ("motivo").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[serde(rename = "Entrega")]
    Delivery,
    #[serde(rename = "Retiro y Entrega")]
    PickupAndDeliver,
    #[serde(rename = "Retiro")]
    Pickup,
}

impl Reason {
    pub const ALL: [Reason; 3] = [Reason::Delivery, Reason::PickupAndDeliver, Reason::Pickup];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Delivery => "Entrega",
            Reason::PickupAndDeliver => "Retiro y Entrega",
            Reason::Pickup => "Retiro",
        }
    }
}

impl core::fmt::Display for Reason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reason::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation("motivo", format!("'{s}' is not a valid reason")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_department_parses_from_its_display_name() {
        for d in Department::ALL {
            assert_eq!(d.as_str().parse::<Department>().unwrap(), d);
        }
    }

    #[test]
    fn serde_names_match_display_names() {
        for d in Department::ALL {
            assert_eq!(serde_json::to_value(d).unwrap(), d.as_str());
        }
        for r in Reason::ALL {
            assert_eq!(serde_json::to_value(r).unwrap(), r.as_str());
        }
    }

    #[test]
    fn unknown_department_is_a_field_error() {
        let err = "Nonexistent".parse::<Department>().unwrap_err();
        assert_eq!(err.field(), Some("departamento"));
    }

    #[test]
    fn reason_requires_exact_name() {
        assert_eq!("Retiro y Entrega".parse::<Reason>().unwrap(), Reason::PickupAndDeliver);
        assert!("entrega".parse::<Reason>().is_err());
    }
}

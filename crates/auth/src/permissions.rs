use serde::Serialize;

use crate::Role;

const ANY_ROLE: &[Role] = &[Role::Admin, Role::Agente, Role::Repartidor];
const BACK_OFFICE: &[Role] = &[Role::Admin, Role::Agente];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const FIELD_CREW: &[Role] = &[Role::Admin, Role::Repartidor];

/// Operation identifier guarded by the authorization gate.
///
/// Each operation declares its accepted role set statically in
/// [`Operation::accepted_roles`]; the table is the single source of truth for
/// who may do what, independent of how the request arrived.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateShipment,
    UpdateShipment,
    DeleteShipment,
    ChangeShipmentState,
    UploadShipmentPhoto,
    ExportShipments,
    ReadShipments,
    ReadShipmentMessages,
    ListAllMessages,
    CreateUser,
    ListUsers,
    DeactivateUser,
}

impl Operation {
    pub fn accepted_roles(&self) -> &'static [Role] {
        match self {
            Operation::CreateShipment
            | Operation::UpdateShipment
            | Operation::DeleteShipment
            | Operation::ExportShipments => BACK_OFFICE,
            Operation::ChangeShipmentState
            | Operation::ReadShipments
            | Operation::ReadShipmentMessages => ANY_ROLE,
            Operation::UploadShipmentPhoto => FIELD_CREW,
            Operation::ListAllMessages
            | Operation::CreateUser
            | Operation::ListUsers
            | Operation::DeactivateUser => ADMIN_ONLY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateShipment => "shipments.create",
            Operation::UpdateShipment => "shipments.update",
            Operation::DeleteShipment => "shipments.delete",
            Operation::ChangeShipmentState => "shipments.change_state",
            Operation::UploadShipmentPhoto => "shipments.upload_photo",
            Operation::ExportShipments => "shipments.export",
            Operation::ReadShipments => "shipments.read",
            Operation::ReadShipmentMessages => "messages.read",
            Operation::ListAllMessages => "messages.list",
            Operation::CreateUser => "users.create",
            Operation::ListUsers => "users.list",
            Operation::DeactivateUser => "users.deactivate",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

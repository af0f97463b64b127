use crate::models::resource::ConnectionId;

pub trait CredentialStore: Send + Sync {
    /// True iff the connection's stored credentials currently authenticate.
    fn credentials_valid(&self, connection: &ConnectionId) -> bool;
}

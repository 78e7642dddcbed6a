use serde::{Deserialize, Serialize};
use services::{Actor, Role};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    /// Anything outside the closed role set fails to decode.
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.0.sub, self.0.role)
    }
}

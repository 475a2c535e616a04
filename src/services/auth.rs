/// Gate for admin operations. Not a security boundary; swap in a real check by injecting
/// another implementation into the application state.
pub trait AdminAuth: Send + Sync {
    fn authorize(&self, token: &str) -> bool;
}

/// Plain shared-secret comparison, the default.
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl AdminAuth for SharedSecret {
    fn authorize(&self, token: &str) -> bool {
        !self.secret.is_empty() && token == self.secret
    }
}

use crate::wire::HealthRes;

/// Health check shared by every API surface.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Reports the service as healthy. Callers need no instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Care API is alive".into(),
        }
    }
}

use std::fmt;

use anyhow::Result;

/// Resource released during teardown, in release order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Surfaces,
    Programs,
    Geometry,
    Backdrop,
    Context,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Surfaces => "wave field surfaces",
            ResourceKind::Programs => "stage programs",
            ResourceKind::Geometry => "quad geometry",
            ResourceKind::Backdrop => "backdrop",
            ResourceKind::Context => "gpu context",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct ReleaseFailure {
    pub resource: ResourceKind,
    pub error: anyhow::Error,
}

/// Outcome of a best-effort teardown.
///
/// Every step runs regardless of earlier failures; failures are logged and
/// collected here instead of aborting the teardown.
#[derive(Debug, Default)]
pub struct ReleaseReport {
    released: Vec<ResourceKind>,
    failures: Vec<ReleaseFailure>,
}

impl ReleaseReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&mut self, resource: ResourceKind, step: impl FnOnce() -> Result<()>) {
        match step() {
            Ok(()) => {
                tracing::debug!(%resource, "released");
                self.released.push(resource);
            }
            Err(error) => {
                tracing::warn!(%resource, error = %error, "failed to release resource; continuing teardown");
                self.failures.push(ReleaseFailure { resource, error });
            }
        }
    }

    pub fn released(&self) -> &[ResourceKind] {
        &self.released
    }

    pub fn failures(&self) -> &[ReleaseFailure] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_step_does_not_stop_later_releases() {
        let mut report = ReleaseReport::new();
        report.release(ResourceKind::Surfaces, || Ok(()));
        report.release(ResourceKind::Programs, || anyhow::bail!("device lost"));
        report.release(ResourceKind::Geometry, || Ok(()));
        report.release(ResourceKind::Backdrop, || Ok(()));

        assert_eq!(
            report.released(),
            &[
                ResourceKind::Surfaces,
                ResourceKind::Geometry,
                ResourceKind::Backdrop
            ]
        );
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].resource, ResourceKind::Programs);
        assert!(!report.is_clean());
    }
}

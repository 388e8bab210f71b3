//! Application lifecycle operations supplied by the embedding program.

use async_trait::async_trait;
use dial_xml::AppResource;

use crate::error::DelegateError;

/// Owner of the applications a DIAL server exposes.
///
/// The router keeps no application state of its own: every request asks the
/// delegate again.
#[async_trait]
pub trait AppDelegate: Send + Sync + 'static {
    /// Current description of `name`, or `None` if no such application exists.
    async fn get_app(&self, name: &str) -> Option<AppResource>;

    /// Launch `name` with an optional text payload.
    ///
    /// Returns the session token of the running instance when there is one;
    /// it becomes the last segment of the `Location` header.
    async fn launch_app(
        &self,
        name: &str,
        payload: Option<String>,
    ) -> Result<Option<String>, DelegateError>;

    /// Stop the instance `pid` of `name`, returning whether it was stopped.
    async fn stop_app(&self, name: &str, pid: &str) -> bool;
}

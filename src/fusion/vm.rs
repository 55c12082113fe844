use super::client::FusionClient;
use super::error::{FusionError, Result};
use reqwest::Method;
use serde_json::{json, Map, Value};

/// The power actions the Fusion REST API accepts.
pub const POWER_ACTIONS: &[&str] = &["on", "off", "suspend", "pause", "unpause", "reset"];

impl FusionClient {
    /// Lists all VMs known to Fusion. The response array is passed through
    /// as-is; no schema is enforced on the entries.
    pub async fn list_vms(&self) -> Result<Vec<Value>> {
        match self.request(Method::GET, "fusionsvc/vms", None).await? {
            Some(value) => serde_json::from_value(value).map_err(FusionError::Json),
            None => Ok(Vec::new()),
        }
    }

    /// Fetches detailed information for one VM. 404 maps to `NotFound`.
    pub async fn get_vm_info(&self, vm_id: &str) -> Result<Value> {
        let value = self
            .request(Method::GET, &format!("fusionsvc/vms/{}", vm_id), Some(vm_id))
            .await?;
        Ok(value.unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Performs a power action on a VM. The action is validated locally
    /// before any network call; Fusion often replies with an empty body,
    /// in which case a success mapping is synthesized.
    pub async fn power_vm(&self, vm_id: &str, action: &str) -> Result<Value> {
        if !POWER_ACTIONS.contains(&action) {
            return Err(FusionError::InvalidAction(action.to_string()));
        }

        let value = self
            .request(
                Method::POST,
                &format!("fusionsvc/vms/{}/{}", vm_id, action),
                Some(vm_id),
            )
            .await?;
        Ok(value.unwrap_or_else(|| json!({ "status": "success", "action": action })))
    }
}

//! Template descriptors.
//!
//! A descriptor declares the named slots the target artifact expects. It is
//! loaded once per run; a missing descriptor aborts before extraction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use orderdesk_shared::{OrderdeskError, Result};

/// Declares the named slots of one fill target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Template name, used in the filled artifact's file name.
    pub name: String,
    /// Slot names, in output column order.
    pub slots: Vec<String>,
}

/// Load a template descriptor.
pub fn load_template(path: &Path) -> Result<TemplateDescriptor> {
    if !path.exists() {
        return Err(OrderdeskError::template_not_found(path));
    }

    let content = std::fs::read_to_string(path).map_err(|e| OrderdeskError::io(path, e))?;
    let template: TemplateDescriptor = serde_json::from_str(&content)
        .map_err(|e| OrderdeskError::parse(format!("invalid template {}: {e}", path.display())))?;

    if template.slots.is_empty() {
        return Err(OrderdeskError::validation(format!(
            "template {} declares no slots",
            path.display()
        )));
    }

    Ok(template)
}

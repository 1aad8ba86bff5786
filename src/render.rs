//! View-tree registry of one engine instance
//!
//! Managers are created on first lookup and shared afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct ViewManager {
    instance_id: u32,
    root_id: u32,
}

impl ViewManager {
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn root_id(&self) -> u32 {
        self.root_id
    }
}

#[derive(Debug)]
pub struct VirtualNodeManager {
    root_id: u32,
}

impl VirtualNodeManager {
    pub fn root_id(&self) -> u32 {
        self.root_id
    }
}

#[derive(Debug, Default)]
pub struct RenderManager {
    instance_id: u32,
    view_managers: HashMap<u32, Arc<ViewManager>>,
    virtual_node_managers: HashMap<u32, Arc<VirtualNodeManager>>,
}

impl RenderManager {
    pub fn new(instance_id: u32) -> Self {
        Self {
            instance_id,
            ..Default::default()
        }
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn view_manager(&mut self, root_id: u32) -> Arc<ViewManager> {
        let instance_id = self.instance_id;
        self.view_managers
            .entry(root_id)
            .or_insert_with(|| {
                debug!(instance_id, root_id, "Creating view manager");
                Arc::new(ViewManager {
                    instance_id,
                    root_id,
                })
            })
            .clone()
    }

    pub fn virtual_node_manager(&mut self, root_id: u32) -> Arc<VirtualNodeManager> {
        self.virtual_node_managers
            .entry(root_id)
            .or_insert_with(|| {
                debug!(root_id, "Creating virtual node manager");
                Arc::new(VirtualNodeManager { root_id })
            })
            .clone()
    }
}

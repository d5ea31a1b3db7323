//! Selection manifest: the serialized stand-in for the UI's checkbox tree.
//!
//! The presentation layer is an external collaborator; what the pipeline
//! consumes is this mirrored model. A manifest lists DMs and servers (with
//! categories and channels) together with their check state, and loads into
//! a [`SelectionTree`] arena.

use serde::{Deserialize, Serialize};

use crate::domain::selection::{NodeKind, SelectionNode, SelectionTree};
use crate::domain::{AppError, Result};

const fn default_true() -> bool {
    true
}

/// A direct-message entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmEntry {
    /// Remote DM channel id.
    pub id: String,
    /// Display name (recipient or group name).
    pub name: String,
    /// Whether the DM is checked for export.
    #[serde(default)]
    pub checked: bool,
    /// False for DMs the account can no longer read.
    #[serde(default = "default_true")]
    pub available: bool,
}

/// A text channel entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Remote channel id.
    pub id: String,
    /// Channel name, without the `#` prefix.
    pub name: String,
    /// Whether the channel is checked for export.
    #[serde(default)]
    pub checked: bool,
    /// False for channels the account cannot read.
    #[serde(default = "default_true")]
    pub available: bool,
}

/// A channel category inside a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Remote category id.
    pub id: String,
    /// Category name.
    pub name: String,
    /// Checking a category cascades to its channels.
    #[serde(default)]
    pub checked: bool,
    /// Channels grouped under this category, in display order.
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// A server entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Remote guild id.
    pub id: String,
    /// Server name.
    pub name: String,
    /// Checking a server cascades to all its channels.
    #[serde(default)]
    pub checked: bool,
    /// Categorized channels.
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
    /// Channels outside any category.
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// The full selection manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionManifest {
    /// Direct messages, in display order.
    #[serde(default)]
    pub dms: Vec<DmEntry>,
    /// Servers, in display order.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl SelectionManifest {
    /// Parse a manifest from JSON.
    ///
    /// # Errors
    /// Returns a JSON error for malformed input.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(AppError::json_parse)
    }

    /// Build the selection arena and apply the manifest's check state.
    ///
    /// Parent `checked` flags are applied first (cascading), then explicit
    /// leaf flags, so a manifest can either check a whole server/category
    /// or name individual leaves.
    #[must_use]
    pub fn to_tree(&self) -> SelectionTree {
        let mut tree = SelectionTree::new();
        let mut parent_toggles = Vec::new();
        let mut leaf_toggles = Vec::new();

        for dm in &self.dms {
            let mut node = SelectionNode::new(&dm.id, &dm.name, NodeKind::Dm);
            if !dm.available {
                node = node.unavailable();
            }
            let id = tree.add_root(node);
            if dm.checked {
                leaf_toggles.push(id);
            }
        }

        for server in &self.servers {
            let server_id = tree.add_root(SelectionNode::new(
                &server.id,
                &server.name,
                NodeKind::Server,
            ));
            if server.checked {
                parent_toggles.push(server_id);
            }

            for category in &server.categories {
                let category_id = tree.add_child(
                    server_id,
                    SelectionNode::new(&category.id, &category.name, NodeKind::Category),
                );
                if category.checked {
                    parent_toggles.push(category_id);
                }
                for channel in &category.channels {
                    add_channel(&mut tree, category_id, channel, &mut leaf_toggles);
                }
            }

            for channel in &server.channels {
                add_channel(&mut tree, server_id, channel, &mut leaf_toggles);
            }
        }

        for id in parent_toggles {
            tree.toggle(id, true);
        }
        for id in leaf_toggles {
            tree.toggle(id, true);
        }
        tree
    }
}

fn add_channel(
    tree: &mut SelectionTree,
    parent: crate::domain::selection::NodeId,
    channel: &ChannelEntry,
    leaf_toggles: &mut Vec<crate::domain::selection::NodeId>,
) {
    let mut node = SelectionNode::new(&channel.id, &channel.name, NodeKind::Channel);
    if !channel.available {
        node = node.unavailable();
    }
    let id = tree.add_child(parent, node);
    if channel.checked {
        leaf_toggles.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetKind;

    const SAMPLE: &str = r#"{
        "dms": [
            {"id": "d1", "name": "Alice", "checked": true},
            {"id": "d2", "name": "Bob"}
        ],
        "servers": [
            {
                "id": "g1",
                "name": "Guild",
                "categories": [
                    {
                        "id": "cat1",
                        "name": "Text",
                        "checked": true,
                        "channels": [
                            {"id": "c1", "name": "general"},
                            {"id": "c2", "name": "random"}
                        ]
                    }
                ],
                "channels": [
                    {"id": "c3", "name": "welcome", "available": false, "checked": true}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_manifest_round_trips_into_targets() {
        let manifest = SelectionManifest::from_json(SAMPLE).unwrap();
        let tree = manifest.to_tree();
        let targets = tree.resolve().unwrap();

        let ids: Vec<&str> = targets.iter().map(|t| t.target_id.as_str()).collect();
        // Alice first (display order), then the cascaded category channels.
        // The unavailable "welcome" channel never resolves even though the
        // manifest claims it is checked.
        assert_eq!(ids, vec!["d1", "c1", "c2"]);
        assert_eq!(targets[0].kind, TargetKind::Dm);
        assert_eq!(targets[1].parent_path, vec!["Guild".to_string()]);
    }

    #[test]
    fn test_empty_manifest_resolves_to_error() {
        let manifest = SelectionManifest::from_json("{}").unwrap();
        let tree = manifest.to_tree();
        assert!(tree.resolve().is_err());
    }

    #[test]
    fn test_malformed_manifest_is_a_json_error() {
        assert!(SelectionManifest::from_json("{not json").is_err());
    }
}

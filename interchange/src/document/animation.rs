//! Animations: channels bind samplers to node properties

use serde::{Deserialize, Serialize};

use super::JsonObject;
use crate::ids::{AccessorId, AnimationSamplerId, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

/// Animated node property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Path {
    Translation,
    Rotation,
    Scale,
    Weights,
    /// Property defined by an extension
    Other(String),
}

impl Path {
    /// Floats per keyframe value, `None` for morph weights and extensions
    pub fn component_count(&self) -> Option<usize> {
        match self {
            Path::Translation | Path::Scale => Some(3),
            Path::Rotation => Some(4),
            Path::Weights | Path::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Path::Translation => "translation",
            Path::Rotation => "rotation",
            Path::Scale => "scale",
            Path::Weights => "weights",
            Path::Other(name) => name,
        }
    }
}

impl From<String> for Path {
    fn from(value: String) -> Self {
        match value.as_str() {
            "translation" => Path::Translation,
            "rotation" => Path::Rotation,
            "scale" => Path::Scale,
            "weights" => Path::Weights,
            _ => Path::Other(value),
        }
    }
}

impl From<Path> for String {
    fn from(path: Path) -> String {
        path.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    pub path: Path,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub sampler: AnimationSamplerId,
    pub target: ChannelTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSampler {
    /// Keyframe times in seconds
    pub input: AccessorId,
    #[serde(default)]
    pub interpolation: Interpolation,
    pub output: AccessorId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub channels: Vec<Channel>,
    pub samplers: Vec<AnimationSampler>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

impl Animation {
    /// Sampler driving `path` of `node`, adding a channel and a placeholder
    /// sampler when none exists yet. The caller fills in input and output.
    pub fn channel_sampler(&mut self, node: NodeId, path: Path) -> &mut AnimationSampler {
        let existing = self
            .channels
            .iter()
            .find(|c| c.target.node == Some(node) && c.target.path == path)
            .map(|c| c.sampler.index());

        let index = match existing {
            Some(index) if index < self.samplers.len() => index,
            _ => {
                let sampler = AnimationSamplerId::from_index(self.samplers.len());
                self.samplers.push(AnimationSampler {
                    input: AccessorId(0),
                    interpolation: Interpolation::Linear,
                    output: AccessorId(0),
                });
                self.channels.push(Channel {
                    sampler,
                    target: ChannelTarget {
                        node: Some(node),
                        path,
                        extensions: JsonObject::new(),
                    },
                });
                sampler.index()
            }
        };
        &mut self.samplers[index]
    }
}

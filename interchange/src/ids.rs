//! Typed indices into the document's flat lists
//!
//! Every cross-reference in a glTF document is a plain integer. Wrapping each
//! list's index in its own type keeps an accessor index from being used as a
//! node index. All ids serialize as bare JSON integers.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident => $list:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u32);

            impl $name {
                /// Name of the top-level JSON list this id points into
                pub const LIST: &'static str = $list;

                pub fn index(self) -> usize {
                    self.0 as usize
                }

                /// Id of the element at `index` in its list
                pub fn from_index(index: usize) -> Self {
                    Self(index as u32)
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}[{}]", $list, self.0)
                }
            }
        )*
    };
}

define_id! {
    BufferId => "buffers";
    BufferViewId => "bufferViews";
    /// Index into `accessors`
    AccessorId => "accessors";
    ImageId => "images";
    SamplerId => "samplers";
    TextureId => "textures";
    MaterialId => "materials";
    MeshId => "meshes";
    SkinId => "skins";
    /// Index into `nodes`
    NodeId => "nodes";
    SceneId => "scenes";
    AnimationId => "animations";
    CameraId => "cameras";
    /// Index into an animation's own `samplers` list
    AnimationSamplerId => "samplers";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_integer() {
        let json = serde_json::to_string(&AccessorId(7)).unwrap();
        assert_eq!(json, "7");
        let id: NodeId = serde_json::from_str("3").unwrap();
        assert_eq!(id, NodeId(3));
    }

    #[test]
    fn test_id_display_names_list() {
        assert_eq!(BufferViewId(2).to_string(), "bufferViews[2]");
        assert_eq!(MeshId::from_index(4).index(), 4);
    }
}

//! Split and merge policies for the surface quad-tree.

use orrery_config::LodSettings;

use crate::QuadTreeNode;

/// Hysteresis applied around each threshold.
const SPLIT_MARGIN: f64 = 1.1;
const MERGE_MARGIN: f64 = 0.9;

/// Texture-driven policy: a patch splits once it covers more pixels than
/// its texture has texels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureLod {
    pub min_density: u32,
    /// Vertices per side at LOD 0, halved at every level.
    pub density: u32,
    pub max_lod: u8,
    /// Texels per side of a patch texture, when one is loaded.
    pub texture_size: Option<u32>,
}

impl TextureLod {
    pub fn density(&self, lod: u8) -> u32 {
        self.density
            .checked_shr(u32::from(lod))
            .unwrap_or(0)
            .max(self.min_density)
            .max(1)
    }
}

/// Geometry-driven policy: a patch splits once a grid cell spans more than
/// `max_vertex_size` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexSizeLod {
    pub max_vertex_size: f64,
    pub density: u32,
    pub max_lod: u8,
}

impl VertexSizeLod {
    fn vertex_size(&self, apparent_size: f64) -> f64 {
        apparent_size / f64::from(self.density.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LodControl {
    Texture(TextureLod),
    VertexSize(VertexSizeLod),
    /// Texture metric when a texture size is known, vertex metric otherwise.
    TextureOrVertexSize {
        texture: TextureLod,
        vertex: VertexSizeLod,
    },
    /// Vertex metric, with patches farther than `max_distance` never shown.
    VertexSizeMaxDistance {
        vertex: VertexSizeLod,
        max_distance: f64,
    },
}

impl LodControl {
    pub fn from_settings(settings: &LodSettings) -> Self {
        LodControl::VertexSize(VertexSizeLod {
            max_vertex_size: settings.max_vertex_size,
            density: settings.patch_density,
            max_lod: u8::try_from(settings.max_lod).unwrap_or(u8::MAX),
        })
    }

    pub fn max_lod(&self) -> u8 {
        match self {
            LodControl::Texture(texture) => texture.max_lod,
            LodControl::VertexSize(vertex) | LodControl::VertexSizeMaxDistance { vertex, .. } => {
                vertex.max_lod
            }
            LodControl::TextureOrVertexSize { texture, vertex } => {
                if texture.texture_size.is_some() {
                    texture.max_lod
                } else {
                    vertex.max_lod
                }
            }
        }
    }

    /// Vertices per patch side at `lod`.
    pub fn density(&self, lod: u8) -> u32 {
        match self {
            LodControl::Texture(texture) => texture.density(lod),
            LodControl::VertexSize(vertex) | LodControl::VertexSizeMaxDistance { vertex, .. } => {
                vertex.density.max(1)
            }
            LodControl::TextureOrVertexSize { texture, vertex } => {
                if texture.texture_size.is_some() {
                    texture.density(lod)
                } else {
                    vertex.density.max(1)
                }
            }
        }
    }

    /// Ratio of the current metric to its threshold; above 1 means too coarse.
    fn pressure(&self, apparent_size: f64) -> Option<f64> {
        let texture_pressure = |t: &TextureLod| {
            t.texture_size
                .map(|size| apparent_size / f64::from(size.max(1)))
        };
        match self {
            LodControl::Texture(texture) => texture_pressure(texture),
            LodControl::VertexSize(vertex) | LodControl::VertexSizeMaxDistance { vertex, .. } => {
                Some(vertex.vertex_size(apparent_size) / vertex.max_vertex_size)
            }
            LodControl::TextureOrVertexSize { texture, vertex } => texture_pressure(texture)
                .or_else(|| Some(vertex.vertex_size(apparent_size) / vertex.max_vertex_size)),
        }
    }

    pub fn should_split(&self, node: &QuadTreeNode, apparent_size: f64, _distance: f64) -> bool {
        if node.lod() >= self.max_lod() || !node.visible {
            return false;
        }
        self.pressure(apparent_size)
            .is_some_and(|p| p > SPLIT_MARGIN)
    }

    pub fn should_merge(&self, node: &QuadTreeNode, apparent_size: f64, _distance: f64) -> bool {
        if !node.visible {
            return true;
        }
        self.pressure(apparent_size)
            .is_some_and(|p| p < MERGE_MARGIN)
    }

    pub fn should_instantiate(&self, node: &QuadTreeNode, _apparent_size: f64, distance: f64) -> bool {
        if let LodControl::VertexSizeMaxDistance { max_distance, .. } = self
            && distance > *max_distance
        {
            return false;
        }
        node.visible && !node.has_children()
    }

    pub fn should_remove(&self, node: &QuadTreeNode, _apparent_size: f64, distance: f64) -> bool {
        if let LodControl::VertexSizeMaxDistance { max_distance, .. } = self
            && distance > *max_distance
        {
            return true;
        }
        !node.visible
    }
}

use bitflags::bitflags;

bitflags! {
    /// What an anchor, or anything below it, contributes to the scene.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AnchorContent: u32 {
        /// Emits light.
        const EMISSIVE = 1 << 0;
        /// Reflects light from an emissive anchor.
        const REFLECTIVE = 1 << 1;
        /// Has children.
        const SYSTEM = 1 << 2;
        /// Indexes its children in a luminosity octree.
        const OCTREE_SYSTEM = 1 << 3;
    }
}

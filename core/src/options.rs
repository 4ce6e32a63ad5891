//! Per-compilation configuration for [`SpirvContext`].
//!
//! [`SpirvContext`]: crate::spirv::SpirvContext

/// Shader stage (or library) of the entry point being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ShaderModelKind {
    Pixel,
    Vertex,
    Geometry,
    Hull,
    Domain,
    Compute,
    Library,
    RayGeneration,
    Intersection,
    AnyHit,
    ClosestHit,
    Miss,
    Callable,
    Mesh,
    Amplification,
    #[default]
    Invalid,
}

impl ShaderModelKind {
    pub fn is_ray_tracing(self) -> bool {
        self >= ShaderModelKind::RayGeneration && self <= ShaderModelKind::Callable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    pub shader_model: ShaderModelKind,

    /// Profile version, e.g. 6.5 for `ps_6_5`.
    pub major_version: u32,
    pub minor_version: u32,

    /// DWARF version recorded in every compilation unit.
    pub dwarf_version: u32,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            shader_model: ShaderModelKind::Invalid,
            major_version: 0,
            minor_version: 0,
            dwarf_version: 4,
        }
    }
}

impl ContextOptions {
    pub fn with_profile(shader_model: ShaderModelKind, major: u32, minor: u32) -> Self {
        Self {
            shader_model,
            major_version: major,
            minor_version: minor,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_tracing_range() {
        assert!(ShaderModelKind::RayGeneration.is_ray_tracing());
        assert!(ShaderModelKind::Callable.is_ray_tracing());
        assert!(ShaderModelKind::Miss.is_ray_tracing());
        assert!(!ShaderModelKind::Compute.is_ray_tracing());
        assert!(!ShaderModelKind::Mesh.is_ray_tracing());
    }

    #[test]
    fn test_default_options() {
        let options = ContextOptions::default();
        assert_eq!(options.shader_model, ShaderModelKind::Invalid);
        assert_eq!(options.dwarf_version, 4);

        let ps = ContextOptions::with_profile(ShaderModelKind::Pixel, 6, 5);
        assert_eq!(ps.major_version, 6);
        assert_eq!(ps.minor_version, 5);
        assert_eq!(ps.dwarf_version, 4);
    }
}

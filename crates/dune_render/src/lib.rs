pub mod camera;
pub mod gpu_context;
pub mod scene_frame;
pub mod scene_pipeline;
pub mod vertex;

pub use camera::{view_projection, OrbitCamera};
pub use gpu_context::GpuContext;
pub use scene_frame::{SceneFrame, SceneMesh, SceneUniform};
pub use scene_pipeline::ScenePipeline;
pub use vertex::MeshVertex;

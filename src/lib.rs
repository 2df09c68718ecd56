pub mod error;
pub mod manager;
pub mod math;
pub mod order;
pub mod path;
pub mod stage;
pub mod trigger;

pub use error::{Result, StageError};
pub use manager::{PathId, PathManager};
pub use order::{EnemyOrder, MoveDirection, OrderKind};
pub use path::{ActivationChange, Direction, EndBehavior, Path, PathSegment, SegmentShape};
pub use stage::{
    EntityHandle, EntityId, EntityLayer, NullView, RenderView, StageConfig, StageDocument,
    StageDriver, TemplateRegistry, TickReport,
};
pub use trigger::{CreationData, EntityKind, NodeKind, SpawnRequest, TriggerNode};

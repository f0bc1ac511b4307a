mod arc_type;
mod narrative_arc;
mod photo;
mod raw_record;
mod scope;

pub use arc_type::ArcType;
pub use narrative_arc::{EmotionalPoint, NarrativeArc};
pub use photo::{ActionIntensity, Emotion, Photo, PlayType, TimeInGame};
pub use raw_record::RawPhotoRecord;
pub use scope::{PhotoFilter, Scope};

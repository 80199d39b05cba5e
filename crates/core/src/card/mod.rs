//! Card records: the external shape, the stored row, and the mapping between them.

mod external;
mod normalize;
mod type_line;
mod types;

pub use external::{CardFace, CardShape, ExternalCard, FaceFields, ImageUris, Prices, Printing};
pub use normalize::{
    normalize, parse_price, skip_reason, Normalized, SkipReason, EXCLUDED_LAYOUTS,
    FACE_TEXT_SEPARATOR,
};
pub use type_line::{parse_type_line, TypeLine, CARD_TYPES, SUPERTYPES};
pub use types::Card;

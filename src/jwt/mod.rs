pub mod claims;
pub mod serializer;
pub mod validity;

pub use claims::{issue_claims, ClaimValue, ClaimsMap};
pub use serializer::{JwtSerializer, PINNED_ALGORITHM};
pub use validity::{remaining_seconds, revocation_ttl, REVOCATION_GRACE};

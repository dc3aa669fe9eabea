pub mod chord;
pub mod interval;
pub mod note;

pub use chord::*;
pub use interval::*;
pub use note::*;

use rand::Rng;
use uuid::Uuid;

/// Random v4 id drawn from the caller's rng, so seeded runs stay reproducible.
pub(crate) fn challenge_id<R: Rng>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

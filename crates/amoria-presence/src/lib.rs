//! # amoria-presence
//!
//! Simulated-presence engine for Amoria. Provides:
//!
//! - A candidate registry fed by views rendering user lists
//! - A grant store mapping user ids to simulated-presence expiries
//! - A rotation scheduler that periodically grants random batches
//! - An expiry sweeper that evicts lapsed grants
//! - A query facade (`is_fake_online` / `is_online_or_fake`) for rendering
//!   online indicators
//!
//! The service is an explicitly constructed object with a `start`/`stop`
//! lifecycle; clock and random source are injectable for deterministic
//! tests.

pub mod candidate;
pub mod clock;
pub mod grant;
pub mod profile;
pub mod random;
pub mod rotation;
pub mod simulator;
pub mod sweeper;

pub use candidate::{Candidate, CandidateRegistry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use grant::GrantStore;
pub use profile::{OnlineFlag, ProfilePresence};
pub use random::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
pub use rotation::Rotation;
pub use simulator::PresenceSimulator;
pub use sweeper::Sweeper;

// Entity Models
//
// Person: stable identity plus values fixed at registration
// Roster: ordered, append-only collection of people with lookups

pub mod person;
pub mod roster;

pub use person::Person;
pub use roster::Roster;

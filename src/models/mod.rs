mod candidate;
mod outfit;

pub use candidate::{
    Candidate, CandidateSet, CategoryCandidates, ProductId, ProductPayload, RawCandidate,
};
pub use outfit::{
    AssembleRequest, AssemblyTimings, ItemRequest, OutfitItem, OutfitRequest, OutfitResponse,
    OutfitStatus, ScenarioOutcome, ScenarioResult,
};

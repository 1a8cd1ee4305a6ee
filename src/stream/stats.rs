//! # Stream Statistics
//!
//! Three independent analyzers over a synthesized address stream: the
//! stride-run/jump histogram, the reuse-distance histogram, and the
//! cross-stream signature matcher used to surface aliasing and overlap
//! between accesses to the same allocation.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::stream::synthesizer::AddressStream;

/// Stride-run and jump profile of one stream
///
/// Every consecutive pair of addresses is exactly one of: a unit stride
/// (extends the current run), a duplicate (difference zero, not a stride),
/// or a jump (closes the run). So
/// `sum(run_length * count) + duplicates + jump_count = len - 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrideProfile {
    /// Shortest run observed, if any run closed
    pub min_run: Option<usize>,
    /// Run length → number of runs of that length
    pub runs: BTreeMap<usize, usize>,
    /// Jump distance → ordinal positions (index of the pair) where it occurred
    pub jumps: BTreeMap<i64, Vec<usize>>,
    /// Number of zero-difference (repeat) steps
    pub duplicates: usize,
}

/// Scan consecutive pairs of a stream into a [`StrideProfile`]
pub fn stride_profile(addresses: &[i64]) -> StrideProfile {
    let mut profile = StrideProfile::default();
    let mut run = 0usize;

    for (pos, pair) in addresses.windows(2).enumerate() {
        match pair[1] - pair[0] {
            1 => run += 1,
            0 => profile.duplicates += 1,
            jump => {
                if run > 0 {
                    close_run(&mut profile, run);
                    run = 0;
                }
                profile.jumps.entry(jump).or_default().push(pos);
            }
        }
    }
    if run > 0 {
        close_run(&mut profile, run);
    }
    profile
}

fn close_run(profile: &mut StrideProfile, length: usize) {
    *profile.runs.entry(length).or_insert(0) += 1;
    profile.min_run = Some(profile.min_run.map_or(length, |m| m.min(length)));
}

/// Reuse-distance profile of one stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReuseProfile {
    /// Reuse distance → number of recurrences at that distance
    pub histogram: BTreeMap<usize, usize>,
    /// Count-weighted average distance; `None` means no address repeats
    pub average: Option<f64>,
}

/// Compute the reuse-distance histogram of a stream
///
/// For each distinct address, the distance between consecutive recurrences
/// is the number of *distinct* addresses strictly between them.
pub fn reuse_profile(addresses: &[i64]) -> ReuseProfile {
    let mut positions: HashMap<i64, Vec<usize>> = HashMap::new();
    for (pos, &addr) in addresses.iter().enumerate() {
        positions.entry(addr).or_default().push(pos);
    }

    let mut profile = ReuseProfile::default();
    for occurrences in positions.values() {
        for pair in occurrences.windows(2) {
            let between: HashSet<i64> = addresses[pair[0] + 1..pair[1]].iter().copied().collect();
            *profile.histogram.entry(between.len()).or_insert(0) += 1;
        }
    }

    let total: usize = profile.histogram.values().sum();
    if total > 0 {
        let weighted: usize = profile
            .histogram
            .iter()
            .map(|(distance, count)| distance * count)
            .sum();
        profile.average = Some(weighted as f64 / total as f64);
    }
    profile
}

/// First/last addresses of one member stream in an overlap group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpan {
    /// First address of the stream
    pub first: i64,
    /// Last address of the stream
    pub last: i64,
}

/// Streams with identical synthesized names, reported for overlap analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapGroup {
    /// Shared composite name (`function;allocation;kind`)
    pub name: String,
    /// [min, max] address span over the union of all members
    pub span: (i64, i64),
    /// Per-member [first, last] spans, in stream order
    pub members: Vec<MemberSpan>,
}

/// Group streams by synthesized name and report overlap spans
///
/// Only groups with more than one member are reported: the same allocation
/// accessed at multiple syntactic sites (a read and a write of one alias,
/// or repeated patterns in different branches). Empty streams carry no span
/// and are ignored.
pub fn match_streams(streams: &[AddressStream]) -> Vec<OverlapGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&AddressStream>> = HashMap::new();
    for stream in streams {
        if stream.addresses.is_empty() {
            continue;
        }
        if !grouped.contains_key(stream.name.as_str()) {
            order.push(&stream.name);
        }
        grouped.entry(&stream.name).or_default().push(stream);
    }

    let mut groups = Vec::new();
    for name in order {
        let members = &grouped[name];
        if members.len() < 2 {
            continue;
        }
        let min = members
            .iter()
            .flat_map(|s| s.addresses.iter().copied())
            .min()
            .unwrap_or(0);
        let max = members
            .iter()
            .flat_map(|s| s.addresses.iter().copied())
            .max()
            .unwrap_or(0);
        groups.push(OverlapGroup {
            name: name.to_string(),
            span: (min, max),
            members: members
                .iter()
                .map(|s| MemberSpan {
                    first: s.addresses[0],
                    last: *s.addresses.last().expect("non-empty stream"),
                })
                .collect(),
        });
    }
    groups
}

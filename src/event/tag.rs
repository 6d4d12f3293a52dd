//! Named tag constants, grouped by the model family that owns them.
//!
//! Tags are laid out on four bases that double as the length-kind
//! boundaries : `WORD = 64`, `DWORD = 128`, `TEXT = 192`,
//! `DATA = 208` (a `TEXT`-range sub-base the source reserves for blob
//! events). Exact numeric offsets below are grounded on
//! `pyflp/mixer.py` and `pyflp/pattern.py`'s `EventEnum` members where
//! those modules name them explicitly; the `PluginId` family is not
//! present in the filtered source excerpt available here; its offsets
//! are chosen to be internally consistent with the four-base scheme and
//! distinct from the neighboring families, not lifted from a real FL
//! Studio build.

const WORD: u8 = 64;
const DWORD: u8 = 128;
const TEXT: u8 = 192;
const DATA: u8 = 208;

/// Tags belonging to the `InsertID` family (`pyflp.mixer.InsertID`).
pub(crate) mod insert {
    use super::*;

    pub(crate) const ICON: u8 = WORD + 31;
    pub(crate) const OUTPUT: u8 = DWORD + 19;
    pub(crate) const COLOR: u8 = DWORD + 21;
    pub(crate) const INPUT: u8 = DWORD + 26;
    pub(crate) const NAME: u8 = TEXT + 12;
    pub(crate) const ROUTING: u8 = DATA + 27;
    pub(crate) const FLAGS: u8 = DATA + 28;
}

/// Tags belonging to the `MixerID` family (`pyflp.mixer.MixerID`), which
/// carry mixer-wide rather than per-insert state.
pub(crate) mod mixer {
    use super::*;

    pub(crate) const PARAMS: u8 = DATA + 17;
}

/// Tags belonging to the `SlotID` family (`pyflp.mixer.SlotID`).
pub(crate) mod slot {
    use super::*;

    pub(crate) const INDEX: u8 = WORD + 34;
}

/// Tags for a slot's plugin wrapper, not named in the filtered source
/// excerpt; offsets are invented but laid out on the same four-base
/// scheme, see the module doc comment.
pub(crate) mod plugin {
    use super::*;

    pub(crate) const ICON: u8 = WORD + 27;
    pub(crate) const COLOR: u8 = DWORD + 8;
    pub(crate) const INTERNAL_NAME: u8 = TEXT + 10;
    pub(crate) const NAME: u8 = TEXT + 11;
    pub(crate) const DATA: u8 = DATA + 0;
}

/// Tags belonging to the `PatternID` family (`pyflp.pattern.PatternID`).
pub(crate) mod pattern {
    use super::*;

    pub(crate) const LOOPED: u8 = 26;
    pub(crate) const NEW: u8 = WORD + 1;
    pub(crate) const COLOR: u8 = DWORD + 22;
    pub(crate) const NAME: u8 = TEXT + 1;
    pub(crate) const LENGTH: u8 = DWORD + 36;
    pub(crate) const CONTROLLERS: u8 = DATA + 15;
    pub(crate) const NOTES: u8 = DATA + 16;
}

/// Tags belonging to the `PatternsID` family (`pyflp.pattern.PatternsID`):
/// state for the patterns collection as a whole, not any one pattern.
pub(crate) mod patterns {
    use super::*;

    pub(crate) const PLAY_TRUNCATED_NOTES: u8 = 30;
    pub(crate) const CURRENTLY_SELECTED: u8 = WORD + 3;
}

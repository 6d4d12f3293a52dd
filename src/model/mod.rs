//! Model projection: the layer that groups a flat `Event` sequence into
//! logical entities . Every type here is a lazy
//! view over borrowed events; none of them copy the owning stream's
//! bodies.

pub(crate) mod mixer;
pub(crate) mod pattern;

pub use mixer::{
    Dock, EqBandKind, Insert, InsertEq, InsertEqBand, InsertEqBandMut, InsertMut, Mixer, MixerMut,
    Slot, SlotMut,
};
pub use pattern::{Controller, ControllerMut, Note, NoteMut, Pattern, PatternMut, Patterns, PatternsMut};

use crate::error::{self, ModelError};

pub(crate) fn model_not_found(what: impl Into<String>) -> ModelError {
    error::ModelNotFound { what: what.into() }.build()
}

pub(crate) fn no_models_found(aggregate: impl Into<String>) -> ModelError {
    error::NoModelsFound {
        aggregate: aggregate.into(),
    }
    .build()
}

pub(crate) fn invalid_value(what: impl Into<String>, description: impl Into<String>) -> ModelError {
    error::InvalidValue {
        what: what.into(),
        description: description.into(),
    }
    .build()
}

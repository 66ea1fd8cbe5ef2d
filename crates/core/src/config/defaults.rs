//! Default values and functions for configuration

use crate::entities::{Markup, Visibility};

pub(crate) fn default_markup() -> Markup {
    Markup::Rdoc
}

pub(crate) fn default_visibility() -> Visibility {
    Visibility::Protected
}

pub(crate) fn default_rename_initialize() -> bool {
    true
}

pub(crate) fn default_meta_method_comments() -> bool {
    true
}

pub(crate) fn default_record_requires() -> bool {
    true
}

//! Value objects shared across the domain.

pub mod prop_keys;
mod property_bag;

pub use property_bag::{
    alpha_percent, boolean_from_tokens, parse_float_prefix, parse_node_id, parse_node_id_list,
    pick_first_string, tokenize, value_to_string, PropertyBag,
};

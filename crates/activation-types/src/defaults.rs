//! Default values for item specs and rules
//!
//! Every parser (the source normalizer and each collector) reads its defaults
//! from here so the different rule sources cannot drift apart.

use crate::value::PredicateOperator;

/// Order given to specs produced by the source normalizer
pub const SPEC_ORDER: i64 = 10;

/// Order given to collected items whose rule does not configure one
pub const COLLECTED_ORDER: i64 = 0;

/// Items are optional unless marked otherwise
pub const REQUIRED: bool = false;

/// Items join the immediate pass unless marked otherwise
pub const DEFER: bool = false;

/// Operator used when a predicate rule omits one, or names an unknown one
pub const PREDICATE_OPERATOR: PredicateOperator = PredicateOperator::Equals;

/// Priority attached to trigger rules that do not configure one
pub const TRIGGER_PRIORITY: i64 = 10;

/// Comparison applied when a version constraint has no operator prefix
pub const VERSION_OPERATOR: &str = ">=";

/// Identifier suffix expected of directly listed items
pub const ITEM_SUFFIX: &str = ".php";

/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Configuration of a [Range Validation Tree](crate::rvt::RangeValidationTree).
//!
//! A tree is configured once, when it is created for a state transfer or checkpoint session, and its
//! configuration never changes afterwards:
//!
//! ```
//! use rvt_rs::config::RvtConfiguration;
//!
//! let config = RvtConfiguration::builder()
//!     .branching_factor(3)
//!     .fetch_range_size(4)
//!     .log_events(true)
//!     .build();
//! ```

use typed_builder::TypedBuilder;

use crate::types::basic::{BranchingFactor, FetchRangeSize};

/// Stores the parameters of a Range Validation Tree.
///
/// The builder does not check the parameters. [`RangeValidationTree::new`](crate::rvt::RangeValidationTree::new)
/// rejects configurations with a `branching_factor` lower than 2 or a `fetch_range_size` of 0.
///
/// ## Log Events
///
/// The tree logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
/// printed onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(Clone, Copy, Debug, PartialEq, Eq, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [RvtConfiguration]. On the builder call the following methods to construct a valid [RvtConfiguration].

    Required:
    - `.branching_factor(...)`
    - `.fetch_range_size(...)`

    Optional:
    - `.log_events(...)`
"))]
pub struct RvtConfiguration {
    #[builder(setter(into, doc = "Set the maximum number of children of a tree node (K). Required."))]
    pub branching_factor: BranchingFactor,
    #[builder(setter(into, doc = "Set the stride between consecutive RVB ids (F). Required."))]
    pub fetch_range_size: FetchRangeSize,
    #[builder(default = false, setter(doc = "Log tree events at the info level? Defaults to false."))]
    pub log_events: bool,
}

impl RvtConfiguration {
    /// Whether the parameters describe a tree that can be built.
    pub fn is_valid(&self) -> bool {
        self.branching_factor.int() >= 2 && self.fetch_range_size.int() > 0
    }
}

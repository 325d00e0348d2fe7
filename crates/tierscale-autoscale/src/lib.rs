//! tierscale-autoscale: threshold-driven topology scaling.
//!
//! Reads the [`TickLoad`](tierscale_model::TickLoad) computed for a tick,
//! compares it against the previous tick's resource counts, and produces the
//! next topology plus the ordered list of actions taken.
//!
//! # Scaling Rules
//!
//! ```text
//! servers:  load > 80% cap                 → +1 server if n < 8        (SUCCESS)
//!           else load < 30% cap && n > 1   → -1 server                 (INFO)
//! queue:    db_util > 0.8 && !queue        → add queue                 (WARNING)
//!           else db_util < 0.2 && queue && backlog == 0 before and after
//!                                          → remove queue              (INFO)
//! dbs:      queue && backlog > 200         → +1 read replica if m < 4  (SUCCESS)
//!           else db_util < 0.3 && m > 1    → -1 read replica           (INFO)
//! ```
//!
//! Every rule reads the counts the tick started with, so at most one unit of
//! each resource changes per tick. Nothing fires while auto-scaling is off.

pub mod policy;
pub mod scaler;

pub use policy::{AutoscalePolicy, PolicyError};
pub use scaler::{Autoscaler, ScaleAction, ScalingPlan};

/// Data layer: columnar tables, label filtering, splitting, and sampling.
///
/// Architecture:
/// ```text
///  data.arrow        label.arrow
///      │                  │
///      ▼                  ▼
///   ┌──────────┐     ┌──────────┐
///   │  loader   │     │  loader   │  file → Table
///   └──────────┘     └──────────┘
///      │                  │
///      ▼                  ▼
///  MeasurementStore  ┌──────────┐
///      │             │  filter   │  SPE_Result ∈ {2,3}, End + 1
///      │             └──────────┘
///      │                  │
///      │                  ▼
///      │             ┌──────────┐
///      │             │  split    │  stratified train / test ordinals
///      │             └──────────┘
///      │                  │   per access
///      │                  ▼
///      │             ┌──────────┐
///      │             │  resolve  │  ordinal → window (clamp, truncate)
///      │             └──────────┘
///      │                  │
///      ▼                  ▼
///   ┌─────────────────────────┐
///   │         tensor          │  slice → (rows, width), pad to fixed length
///   └─────────────────────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod resolve;
pub mod split;
pub mod tensor;

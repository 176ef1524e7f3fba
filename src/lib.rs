//! # fftune - self-tuning FFT planner and executor
//!
//! Transforms are described as [`Problem`]s over strided [`Tensor`]s,
//! planned by a [`Planner`] that searches competing solver strategies, and
//! executed through the resulting [`Plan`]. Planning decisions are memoized
//! as *wisdom*, which can be exported, imported, and shared between
//! processes.
//!
//! ## Features
//!
//! - **Complex DFTs** of any length: fixed-radix Cooley-Tukey, Rader for
//!   primes, Bluestein for everything else
//! - **Real transforms**: halfcomplex r2hc/hc2r, DCT/DST families, DHT
//! - **Real-to-halfcomplex (rdft2)** via half-length complex transforms
//! - **In-place transposes**: cache-oblivious square, gcd and cut
//!   algorithms for rectangles
//! - **Adaptive planning**: patience levels from pure estimation to
//!   exhaustive measurement on the host machine
//! - **Serializable wisdom** so tuning happens once per machine
//!
//! ## Cargo features
//!
//! - `std` (default): measurement-based planning, file wisdom adapters,
//!   the process-wide default planners
//! - `simd` (default): register SSE codelet variants when the host
//!   supports them
//! - `sse`: force SSE codelets without runtime detection
//! - `verbose-logging`: planner search tracing through `log`
//! - `internal-tests`: property-test modules
//!
//! ## Example
//!
//! ```no_run
//! use fftune::{BufSpec, BufToken, Flags, Planner, Problem, Sign, Tensor};
//! use fftune::DftData;
//! use fftune::Complex;
//!
//! let mut planner = Planner::<f64>::new();
//! let problem = Problem::dft_1d(
//!     1024,
//!     Sign::Forward,
//!     BufSpec::aligned(BufToken(0)),
//!     BufSpec::aligned(BufToken(1)),
//! );
//! let plan = planner.plan(&problem, Flags::MEASURE).unwrap();
//! let mut input = vec![Complex::new(0.0f64, 0.0); 1024];
//! let mut output = vec![Complex::new(0.0f64, 0.0); 1024];
//! plan.apply_dft(DftData::OutOfPlace {
//!     input: &mut input,
//!     output: &mut output,
//! })
//! .unwrap();
//! ```

#![no_std]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod buffer;
pub mod fingerprint;
pub mod flags;
pub mod num;
pub mod ops;
pub mod plan;
pub mod planner;
pub mod problem;
pub mod tensor;
pub mod wisdom;

mod codelet;
mod kernels;
mod solver;
mod solvers;
mod twiddle;

#[cfg(feature = "std")]
pub mod api;
#[cfg(feature = "simd")]
mod simd;
#[cfg(feature = "std")]
mod timer;

pub use buffer::{BufSpec, BufToken, DftData, RealData, Rdft2Data};
pub use fingerprint::{Digest, Fingerprinter};
pub use flags::{Flags, Patience};
pub use num::{Complex, Float};
pub use ops::OpCounts;
pub use plan::{Cost, ExecuteError, Plan};
pub use planner::{CostKind, Forget, Hooks, Planner, PlannerStats};
pub use problem::{Problem, ProblemKind, R2rKind, Rdft2Kind, Sign};
pub use tensor::{Dim, Tensor};
pub use twiddle::Wakefulness;
pub use wisdom::{SliceSource, WisdomError, WisdomSink, WisdomSource};
#[cfg(feature = "std")]
pub use wisdom::{ReadSource, WriteSink};

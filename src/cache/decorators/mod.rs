// Copyright 2025 Sqlbind Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cache decorators, composed around the perpetual base in declared order

pub mod blocking;
pub mod fifo;
pub mod logging;
pub mod lru;
pub mod scheduled;
pub mod serialized;
pub mod soft;
pub mod synchronized;
pub mod weak;

pub use blocking::BlockingCache;
pub use fifo::FifoCache;
pub use logging::LoggingCache;
pub use lru::{LruCache, DEFAULT_LRU_SIZE};
pub use scheduled::ScheduledCache;
pub use serialized::SerializedCache;
pub use soft::{SoftCache, DEFAULT_HARD_LINKS};
pub use synchronized::SynchronizedCache;
pub use weak::WeakCache;

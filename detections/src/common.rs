pub use anyhow::{bail, ensure, format_err, Context as _};
pub use bbox::{prelude::*, HW, LTRB};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::{izip, Itertools as _};
pub use log::{debug, info, warn};
pub use ndarray::{Array2, ArrayView2};
pub use once_cell::sync::Lazy;
pub use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
pub use std::{
    fmt, fs,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

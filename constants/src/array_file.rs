/// Magic prefix of a NumPy `.npy` file
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// `.npy` format version written (major, minor)
pub const NPY_VERSION: (u8, u8) = (1, 0);

/// Total header length is padded to a multiple of this
pub const NPY_HEADER_ALIGNMENT: usize = 64;

/// Archive entry name used for the single array of a compressed `.npz`
pub const NPZ_ENTRY_NAME: &str = "arr_0.npy";

/// Extension for uncompressed array files
pub const NPY_EXTENSION: &str = "npy";

/// Extension for compressed array archives
pub const NPZ_EXTENSION: &str = "npz";

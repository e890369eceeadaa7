use wasm_encoder::MemArg;

/// The global index of the heap pointer.
pub const HEAP_PTR: u32 = 0;

/// Every value occupies one `i32` word.
pub const WORD_SIZE: u64 = 4;

/// Default memory argument.
pub const MEM_ARG: MemArg = MemArg {
    offset: 0,
    align: 2,
    memory_index: 0,
};

/// Name under which the entry expression is exported.
pub const ENTRY_EXPORT: &str = "_start";

/// Name under which the linear memory is exported.
pub const MEMORY_EXPORT: &str = "memory";

pub const CODE_SECTION_ID: u8 = 10;
pub const CUSTOM_SECTION_ID: u8 = 0;

/// Custom section read by debuggers to locate the source map.
pub const SOURCE_MAPPING_URL: &str = "sourceMappingURL";

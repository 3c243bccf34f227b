pub(crate) fn le_u32(bytes: &[u8]) -> u32 {
    let mut arr = [0; 4];
    arr.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(arr)
}

pub(crate) fn le_u64(bytes: &[u8]) -> u64 {
    let mut arr = [0; 8];
    arr.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(arr)
}

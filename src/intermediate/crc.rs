//! CRC-32 as used by PNG chunks, zlib and Ethernet (reflected polynomial
//! 0xEDB88320).

const POLYNOMIAL: u32 = 0xedb88320;
static CRC_TABLE: [u32; 256] = make_crc_table();

/// Continues `crc` over `bytes`. Start a new checksum with 0.
///
/// Checksumming `a` then `b` gives the same result as checksumming `a ++ b`
/// in one call, so a chunk's kind and data can be fed separately.
pub fn update(crc: u32, bytes: &[u8]) -> u32 {
    // based off of https://www.w3.org/TR/png-3/#D-CRCAppendix
    let mut c = crc ^ u32::MAX;
    for &b in bytes {
        let lookup_ind = (c ^ b as u32) as usize & 0xff;
        c = CRC_TABLE[lookup_ind] ^ (c >> 8);
    }
    c ^ u32::MAX
}

/// CRC-32 of `bytes` alone.
pub fn checksum(bytes: &[u8]) -> u32 {
    update(0, bytes)
}

const fn make_crc_table() -> [u32; 256] {
    let mut table = [0; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            if c & 1 == 1 {
                c = POLYNOMIAL ^ (c >> 1);
            } else {
                c >>= 1;
            }
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

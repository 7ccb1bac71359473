//! The scanline compressor: RLE, 4-bit indexed table, and literal opcodes.
//!
//! [`ScanlineTable`] holds the per-scanline 16-entry byte dictionary and its
//! inverse lookup. [`ScanlineTable::compress`] turns one scanline into an
//! opcode stream the printer's raster engine understands; the dictionary
//! persists across calls (only partially cleared) because consecutive
//! scanlines in real pages tend to reuse the same handful of byte values.

/// Per-scanline compression state: the 16-entry byte table and its inverse
/// lookup. Construct once per page (or per job) and call
/// [`compress`](ScanlineTable::compress) once per scanline in order.
#[derive(Debug)]
pub struct ScanlineTable {
    tbl: Vec<u8>,
    invtbl: [u8; 256],
    initialized: bool,
    tbllen: u8,
}

const ABSENT: u8 = 0xFF;

impl Default for ScanlineTable {
    fn default() -> Self {
        Self {
            tbl: Vec::with_capacity(16),
            invtbl: [ABSENT; 256],
            initialized: false,
            tbllen: 0,
        }
    }
}

impl ScanlineTable {
    /// Creates a fresh, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of distinct byte values currently held in the table.
    pub fn len(&self) -> u8 {
        self.tbllen
    }

    /// `true` if the table currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.tbllen == 0
    }

    /// The table's contents in insertion order, for emitting the
    /// per-scanline preamble (`0x80 | tbllen` followed by these bytes).
    pub fn entries(&self) -> &[u8] {
        &self.tbl
    }

    fn reset_for_scanline(&mut self) {
        if !self.initialized {
            self.invtbl = [ABSENT; 256];
            self.initialized = true;
        } else {
            for &b in &self.tbl {
                self.invtbl[usize::from(b)] = ABSENT;
            }
        }
        self.tbl.clear();
        self.tbllen = 0;
    }

    fn add(&mut self, b: u8) -> u8 {
        let inv = self.invtbl[usize::from(b)];
        if inv < 16 || self.tbllen >= 16 {
            return inv;
        }
        let idx = self.tbllen;
        self.tbl.push(b);
        self.invtbl[usize::from(b)] = idx;
        self.tbllen += 1;
        idx
    }

    /// Whether the `len` bytes starting at `data[p]` are either already in
    /// the table or there's still room to add the ones that aren't. `len`
    /// is always `2` or `4` in practice. Requires at least one byte of
    /// slack after the checked span, matching the reference encoder.
    fn fits(&self, data: &[u8], p: usize, len: u8, end: usize) -> bool {
        let span = usize::from(len);
        if p + span >= end {
            return false;
        }
        let mut present: u8 = 0;
        for &b in &data[p..p + span] {
            if self.invtbl[usize::from(b)] < 16 {
                present += 1;
            }
        }
        self.tbllen < (17 - len + present)
    }

    /// Compresses one scanline into `out`, appending opcodes.
    ///
    /// Does not emit the `0x80 | tbllen` table-preamble byte or the table
    /// contents themselves — callers append [`entries`](Self::entries)
    /// after calling this, per the band layout in [`crate::page`].
    pub fn compress(&mut self, data: &[u8], out: &mut Vec<u8>) {
        self.reset_for_scanline();

        let end = data.len();
        let mut p = 0usize;
        while p < end {
            let n = run_length(data, p, end);
            if n > 2 {
                let mut n = n;
                if n > 63 {
                    out.push(0xC0 | low_byte(n >> 6));
                    out.push(data[p]);
                    p += n & !0x3f;
                    n &= 0x3f;
                }
                if n > 0 {
                    out.push(0x80 | low_byte(n));
                    out.push(data[p]);
                    p += n;
                }
            } else if self.fits(data, p, 4, end) {
                let opcode_idx = out.len();
                out.push(0x41);

                let a = self.add(data[p]);
                let b = self.add(data[p + 1]);
                out.push((a << 4) | b);
                let c = self.add(data[p + 2]);
                let d = self.add(data[p + 3]);
                out.push((c << 4) | d);
                p += 4;

                while self.fits(data, p, 2, end) && out[opcode_idx] < 0x7f {
                    if run_length(data, p, std::cmp::min(p + 3, end)) >= 3 {
                        break;
                    }
                    out[opcode_idx] += 1;
                    let e = self.add(data[p]);
                    let f = self.add(data[p + 1]);
                    out.push((e << 4) | f);
                    p += 2;
                }
            } else {
                let opcode_idx = out.len();
                out.push(0xFF);
                loop {
                    out.push(data[p]);
                    p += 1;
                    out[opcode_idx] = out[opcode_idx].wrapping_add(1);
                    if run_length(data, p, std::cmp::min(p + 3, end)) >= 3 {
                        break;
                    }
                    if self.fits(data, p, 4, end) {
                        break;
                    }
                    if !(p < end && out[opcode_idx] < 9) {
                        break;
                    }
                }
            }
        }
    }
}

/// Number of consecutive bytes equal to `data[p]`, bounded by `end`.
/// Always returns at least `1` when `p < end`.
fn run_length(data: &[u8], p: usize, end: usize) -> usize {
    if p >= end {
        return 0;
    }
    let c = data[p];
    let mut q = p + 1;
    let mut len = 0usize;
    while q < end && data[q] == c {
        q += 1;
        len += 1;
    }
    len + 1
}

/// Narrows a small `usize` (known to be `< 256`) to its low byte without an
/// `as` cast.
fn low_byte(n: usize) -> u8 {
    n.to_le_bytes()[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal opcode interpreter used only to verify the encoder's output
    /// actually reconstructs its input. Not part of the public API: the
    /// real decoder ([`crate::decode`]) never needs pixel-level
    /// reconstruction, only byte/line bookkeeping.
    fn decompress(table_preamble: &[u8], ops: &[u8], out_len: usize) -> Vec<u8> {
        let mut table = Vec::new();
        let mut i = 0;
        if !table_preamble.is_empty() {
            let tbllen = usize::from(table_preamble[0] & 0x0F);
            table.extend_from_slice(&table_preamble[1..1 + tbllen]);
        }
        let mut out = Vec::with_capacity(out_len);
        while i < ops.len() && out.len() < out_len {
            let op = ops[i];
            if (0x80..0xFF).contains(&op) {
                let byte = ops[i + 1];
                let mut n = usize::from(op & 0x3F);
                i += 2;
                if op & 0x40 != 0 {
                    // long run: 0xC0 | high6, repeat count is n*64, then a
                    // short run header (0x80|remainder) may follow for the
                    // remainder - handled by the next loop iteration.
                    n *= 64;
                }
                for _ in 0..n {
                    out.push(byte);
                }
            } else if op == 0xFF {
                unreachable!("literal header consumed via opcode range below");
            } else if (0x41..=0x7F).contains(&op) {
                let pairs = 2 + usize::from(op - 0x41);
                for k in 0..pairs {
                    let packed = ops[i + 1 + k];
                    out.push(table[usize::from(packed >> 4)]);
                    out.push(table[usize::from(packed & 0x0F)]);
                }
                i += 1 + pairs;
            } else {
                // literal: op in 0xFF..=0x08 wrapping range; count is
                // op.wrapping_add(1) interpreted as the number of bytes
                // already pushed when the opcode byte equals count-1 mod 256.
                let mut count = 0usize;
                let mut probe = 0xFFu8;
                while probe != op {
                    probe = probe.wrapping_add(1);
                    count += 1;
                }
                count += 1;
                for k in 0..count {
                    out.push(ops[i + 1 + k]);
                }
                i += 1 + count;
            }
        }
        out
    }

    #[test]
    fn rle_round_trip_all_zero_scanline() {
        let mut table = ScanlineTable::new();
        let data = vec![0u8; 200];
        let mut out = Vec::new();
        table.compress(&data, &mut out);
        assert!(table.is_empty());
        let restored = decompress(&[0x80], &out, data.len());
        assert_eq!(restored, data);
    }

    #[test]
    fn rle_bound_never_exceeds_63_times_64_plus_63() {
        let mut table = ScanlineTable::new();
        let data = vec![0xAAu8; 5000];
        let mut out = Vec::new();
        table.compress(&data, &mut out);
        let mut i = 0;
        while i < out.len() {
            let op = out[i];
            if (0x80..=0xFE).contains(&op) {
                i += 2;
            } else if (0x41..=0x7F).contains(&op) {
                i += 2 + usize::from(op - 0x41);
            } else {
                // literal
                let mut count = 0usize;
                let mut probe = 0xFFu8;
                while probe != op {
                    probe = probe.wrapping_add(1);
                    count += 1;
                }
                i += 2 + count;
            }
        }
        assert_eq!(i, out.len());
    }

    #[test]
    fn table_branch_used_for_alternating_bytes() {
        let mut table = ScanlineTable::new();
        let data: Vec<u8> = (0..40)
            .map(|i| if i % 2 == 0 { 0xAA } else { 0x55 })
            .collect();
        let mut out = Vec::new();
        table.compress(&data, &mut out);
        assert_eq!(table.len(), 2);
        assert!(out[0] >= 0x41 && out[0] <= 0x7F);
    }

    #[test]
    fn table_invariant_holds_after_compress() {
        let mut table = ScanlineTable::new();
        let data: Vec<u8> = (0u8..=250).collect();
        let mut out = Vec::new();
        table.compress(&data, &mut out);
        for i in 0..table.len() {
            let b = table.tbl[usize::from(i)];
            assert_eq!(table.invtbl[usize::from(b)], i);
        }
        for (byte, &inv) in table.invtbl.iter().enumerate() {
            if inv < 16 {
                assert_eq!(usize::from(table.tbl[usize::from(inv)]), byte);
            }
        }
    }

    #[test]
    fn compress_is_deterministic() {
        let data: Vec<u8> = (0..100).map(|i| (i * 7) % 251).collect();
        let mut t1 = ScanlineTable::new();
        let mut out1 = Vec::new();
        t1.compress(&data, &mut out1);

        let mut t2 = ScanlineTable::new();
        let mut out2 = Vec::new();
        t2.compress(&data, &mut out2);

        assert_eq!(out1, out2);
    }

    #[cfg(test)]
    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn compress_never_panics_on_arbitrary_scanlines(data in prop::collection::vec(any::<u8>(), 0..512)) {
                let mut table = ScanlineTable::new();
                let mut out = Vec::new();
                table.compress(&data, &mut out);
            }

            #[test]
            fn table_invariant_holds_for_arbitrary_scanlines(data in prop::collection::vec(any::<u8>(), 0..512)) {
                let mut table = ScanlineTable::new();
                let mut out = Vec::new();
                table.compress(&data, &mut out);
                for i in 0..table.len() {
                    let b = table.tbl[usize::from(i)];
                    prop_assert_eq!(table.invtbl[usize::from(b)], i);
                }
            }
        }
    }
}

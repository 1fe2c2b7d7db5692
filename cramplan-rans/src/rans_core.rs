//! Shared byte-wise rANS primitives (32-bit state, byte renormalization).
//!
//! Grounded in the classic `ryg_rans` formulation: symbols are encoded back
//! to front so a forward decode recovers them in their original order.

/// Renormalization lower bound.
pub const RANS_L: u32 = 1 << 23;

/// Spread `counts` across exactly `total` slots, keeping every nonzero
/// count at least 1 after normalization. `total` should be a power of two.
pub fn normalize(counts: &[u64], total: u32) -> Vec<u32> {
    let sum: u64 = counts.iter().sum();
    if sum == 0 {
        return vec![0; counts.len()];
    }

    let mut freqs: Vec<u32> = counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0
            } else {
                (((c as u128) * total as u128) / sum as u128).max(1) as u32
            }
        })
        .collect();

    let mut assigned: i64 = freqs.iter().map(|&f| i64::from(f)).sum();
    let mut diff = i64::from(total) - assigned;

    while diff != 0 {
        let step: i64 = if diff > 0 { 1 } else { -1 };
        let candidate = if diff > 0 {
            freqs.iter().enumerate().max_by_key(|&(_, &f)| f)
        } else {
            freqs
                .iter()
                .enumerate()
                .filter(|&(_, &f)| f > 1)
                .max_by_key(|&(_, &f)| f)
        };

        let Some((idx, _)) = candidate else { break };
        freqs[idx] = (i64::from(freqs[idx]) + step) as u32;
        diff -= step;
    }

    assigned = freqs.iter().map(|&f| i64::from(f)).sum();
    debug_assert_eq!(assigned, i64::from(total));
    freqs
}

/// Cumulative frequency table: `cum[i]` is the sum of `freqs[0..i]`.
pub fn cumulative(freqs: &[u32]) -> Vec<u32> {
    let mut cum = Vec::with_capacity(freqs.len());
    let mut acc = 0u32;
    for &f in freqs {
        cum.push(acc);
        acc += f;
    }
    cum
}

/// Find the index `i` such that `cum[i] <= slot < cum[i] + freqs[i]`.
///
/// Zero-frequency buckets (possible when a symbol never occurs) occupy no
/// slots and are skipped automatically since the range check excludes them.
pub fn locate(cum: &[u32], freqs: &[u32], slot: u32) -> usize {
    for i in 0..cum.len() {
        if freqs[i] > 0 && slot >= cum[i] && slot < cum[i] + freqs[i] {
            return i;
        }
    }
    unreachable!("slot {slot} not covered by any bucket")
}

/// Encode `len` symbols, where `params_for(position)` returns the
/// `(cumulative_start, frequency)` rANS parameters of the symbol at that
/// position. `scale_bits` is `log2(total)`.
pub fn encode_with(
    len: usize,
    scale_bits: u32,
    mut params_for: impl FnMut(usize) -> (u32, u32),
) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 4);
    let mut state = RANS_L;

    for position in (0..len).rev() {
        let (start, freq) = params_for(position);
        debug_assert!(freq > 0);
        let x_max = ((RANS_L >> scale_bits) << 8) * freq;
        let mut x = state;
        while x >= x_max {
            out.push((x & 0xFF) as u8);
            x >>= 8;
        }
        state = ((x / freq) << scale_bits) + (x % freq) + start;
    }

    for shift in [24, 16, 8, 0] {
        out.push(((state >> shift) & 0xFF) as u8);
    }
    out.reverse();
    out
}

/// Decode `count` symbols from `buf`. `lookup(slot)` must return the byte to
/// emit along with the `(cumulative_start, frequency)` pair that produced
/// it, so the decoder can invert the same transform `encode_with` applied.
pub fn decode_with(
    buf: &[u8],
    count: usize,
    scale_bits: u32,
    mut lookup: impl FnMut(u32) -> (u8, u32, u32),
) -> Vec<u8> {
    if count == 0 {
        return Vec::new();
    }

    let mask = (1u32 << scale_bits) - 1;
    let mut pos = 4usize;
    let mut state = u32::from(buf[0])
        | (u32::from(buf[1]) << 8)
        | (u32::from(buf[2]) << 16)
        | (u32::from(buf[3]) << 24);

    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let slot = state & mask;
        let (emitted, start, freq) = lookup(slot);
        state = freq * (state >> scale_bits) + slot - start;

        while state < RANS_L {
            state = (state << 8) | u32::from(buf[pos]);
            pos += 1;
        }

        out.push(emitted);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sums_exactly_to_total() {
        let counts = [5u64, 0, 3, 1, 1];
        let freqs = normalize(&counts, 64);
        assert_eq!(freqs.iter().sum::<u32>(), 64);
        assert_eq!(freqs[1], 0);
    }

    #[test]
    fn normalize_keeps_nonzero_counts_nonzero() {
        let counts = [1u64; 16];
        let freqs = normalize(&counts, 16);
        assert!(freqs.iter().all(|&f| f >= 1));
        assert_eq!(freqs.iter().sum::<u32>(), 16);
    }

    #[test]
    fn locate_finds_the_owning_bucket() {
        let freqs = [4u32, 0, 12];
        let cum = cumulative(&freqs);
        assert_eq!(locate(&cum, &freqs, 0), 0);
        assert_eq!(locate(&cum, &freqs, 3), 0);
        assert_eq!(locate(&cum, &freqs, 4), 2);
        assert_eq!(locate(&cum, &freqs, 15), 2);
    }

    #[test]
    fn round_trips_a_single_context_model() {
        let counts = [10u64, 3, 0, 1];
        let scale_bits = 4; // total = 16
        let freqs = normalize(&counts, 1 << scale_bits);
        let cum = cumulative(&freqs);
        let symbols = [0usize, 0, 3, 0, 1, 0];

        let payload = encode_with(symbols.len(), scale_bits, |pos| {
            let s = symbols[pos];
            (cum[s], freqs[s])
        });

        let decoded = decode_with(&payload, symbols.len(), scale_bits, |slot| {
            let idx = locate(&cum, &freqs, slot);
            (idx as u8, cum[idx], freqs[idx])
        });

        let expected: Vec<u8> = symbols.iter().map(|&s| s as u8).collect();
        assert_eq!(decoded, expected);
    }
}

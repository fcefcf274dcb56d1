use anyhow::{Context, Result};
use bitvec::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Loads a Stim .b8 file (binary measurement data).
pub fn load_b8_file<P: AsRef<Path>>(path: P) -> Result<BitVec<u8, Lsb0>> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open .b8 file {}", path.display()))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    // Stim packs each byte least significant bit first
    Ok(BitVec::<u8, Lsb0>::from_vec(buffer))
}

/// Splits packed shot data into per-shot sorted lists of triggered detectors.
///
/// Each shot occupies `bits_per_shot` bits rounded up to a whole byte.
/// Trailing bits that do not form a complete shot are ignored.
pub fn slice_shots(raw_bits: &BitSlice<u8, Lsb0>, bits_per_shot: usize) -> Vec<Vec<usize>> {
    if bits_per_shot == 0 {
        return Vec::new();
    }
    let stride_bits = bits_per_shot.div_ceil(8) * 8;
    let num_shots = raw_bits.len() / stride_bits;

    (0..num_shots)
        .map(|i| {
            let start = i * stride_bits;
            raw_bits[start..start + bits_per_shot].iter_ones().collect()
        })
        .collect()
}

/// Packs shots given as triggered detector lists into .b8 bytes.
///
/// Indices at or beyond `bits_per_shot` are rejected.
pub fn pack_shots(shots: &[Vec<usize>], bits_per_shot: usize) -> Result<Vec<u8>> {
    let stride_bits = bits_per_shot.div_ceil(8) * 8;
    let mut bits = BitVec::<u8, Lsb0>::repeat(false, stride_bits * shots.len());

    for (i, shot) in shots.iter().enumerate() {
        for &detector in shot {
            anyhow::ensure!(
                detector < bits_per_shot,
                "shot {} triggers detector {} but shots have {} detectors",
                i,
                detector,
                bits_per_shot
            );
            bits.set(i * stride_bits + detector, true);
        }
    }
    Ok(bits.into_vec())
}

/// Writes shots to a Stim .b8 file.
pub fn write_b8_file<P: AsRef<Path>>(
    path: P,
    shots: &[Vec<usize>],
    bits_per_shot: usize,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = pack_shots(shots, bits_per_shot)?;
    let mut file = BufWriter::new(
        File::create(path)
            .with_context(|| format!("Failed to create .b8 file {}", path.display()))?,
    );
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout_is_lsb_first_and_byte_padded() {
        let shots = vec![vec![0, 9], vec![], vec![3]];
        let bytes = pack_shots(&shots, 10).unwrap();
        assert_eq!(bytes, vec![0b0000_0001, 0b0000_0010, 0, 0, 0b0000_1000, 0]);
    }

    #[test]
    fn test_slice_recovers_shots() {
        let shots = vec![vec![1, 2, 6], vec![0], vec![], vec![5, 6]];
        let bytes = pack_shots(&shots, 7).unwrap();
        let bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        assert_eq!(slice_shots(&bits, 7), shots);
    }

    #[test]
    fn test_slice_ignores_partial_trailing_shot() {
        let bits = BitVec::<u8, Lsb0>::from_vec(vec![0xFF, 0x01, 0xFF]);
        let shots = slice_shots(&bits, 12);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0], (0..9).collect::<Vec<_>>());
        assert!(slice_shots(&bits, 0).is_empty());
    }

    #[test]
    fn test_pack_rejects_out_of_range_detector() {
        assert!(pack_shots(&[vec![8]], 8).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("mgraph_io_{}.b8", std::process::id()));
        let shots = vec![vec![0, 3], vec![2]];
        write_b8_file(&path, &shots, 4).unwrap();
        let bits = load_b8_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(slice_shots(&bits, 4), shots);
    }
}

//! Reed-Solomon error correction over GF(256).
//!
//! The field is built from the primitive polynomial `x^8 + x^4 + x^3 + x^2 + 1`
//! (0x11D) with primitive element 2, which is the field mandated for QR Code
//! Model 2. Encoding is systematic: the returned bytes are the remainder of the
//! message polynomial (shifted by the degree) divided by the generator.

/// The field's primitive polynomial, including the x^8 term.
const PRIMITIVE: u16 = 0x11d;

struct GaloisTables {
    exp: [u8; 256],
    log: [u8; 256],
}

const fn build_tables() -> GaloisTables {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x > 0xff {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    exp[255] = exp[0];
    GaloisTables { exp, log }
}

static TABLES: GaloisTables = build_tables();

/// Multiplies two field elements.
pub fn gf_mul(x: u8, y: u8) -> u8 {
    if x == 0 || y == 0 {
        return 0;
    }
    let sum = usize::from(TABLES.log[usize::from(x)]) + usize::from(TABLES.log[usize::from(y)]);
    TABLES.exp[sum % 255]
}

/// Returns `2^power` in the field.
pub fn gf_pow2(power: usize) -> u8 {
    TABLES.exp[power % 255]
}

/// Builds the monic generator polynomial `(x - 2^0)(x - 2^1)...(x - 2^(degree-1))`.
///
/// Coefficients are ordered from the highest power down, so `result[0]` is
/// always 1 and the vector has `degree + 1` entries.
pub fn generator_polynomial(degree: usize) -> Vec<u8> {
    let mut poly = vec![1u8];
    for i in 0..degree {
        let root = gf_pow2(i);
        let mut next = vec![0u8; poly.len() + 1];
        for (j, &coef) in poly.iter().enumerate() {
            next[j] ^= coef;
            next[j + 1] ^= gf_mul(coef, root);
        }
        poly = next;
    }
    poly
}

/// Computes `ec_count` error correction codewords for one data block.
///
/// # Panics
///
/// Panics if `data` is empty or `ec_count` is zero.
pub fn rs_encode(data: &[u8], ec_count: usize) -> Vec<u8> {
    assert!(!data.is_empty(), "Data block must not be empty");
    assert!(ec_count >= 1, "At least one error correction codeword is required");

    let generator = generator_polynomial(ec_count);
    let mut buffer = Vec::with_capacity(data.len() + ec_count);
    buffer.extend_from_slice(data);
    buffer.resize(data.len() + ec_count, 0);

    for i in 0..data.len() {
        let coef = buffer[i];
        if coef == 0 {
            continue;
        }
        for (slot, &g) in buffer[i..].iter_mut().zip(generator.iter()) {
            *slot ^= gf_mul(g, coef);
        }
    }
    buffer.split_off(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_log_tables_are_inverse() {
        for i in 0..255usize {
            let v = gf_pow2(i);
            assert_ne!(v, 0);
            assert_eq!(usize::from(TABLES.log[usize::from(v)]), i);
        }
        assert_eq!(gf_pow2(8), 0x1d);
    }

    #[test]
    fn test_gf_mul() {
        assert_eq!(gf_mul(0, 0x53), 0);
        assert_eq!(gf_mul(1, 0x53), 0x53);
        assert_eq!(gf_mul(2, 0x80), 0x1d);
        assert_eq!(gf_mul(0x53, 0xca), gf_mul(0xca, 0x53));
    }

    #[test]
    fn test_generator_polynomial_degree_7() {
        // Exponents of the degree-7 generator: 0, 87, 229, 146, 149, 238, 102, 21.
        let expected: Vec<u8> = [0usize, 87, 229, 146, 149, 238, 102, 21]
            .iter()
            .map(|&e| gf_pow2(e))
            .collect();
        assert_eq!(generator_polynomial(7), expected);
    }

    #[test]
    fn test_annex_vector_numeric_1m() {
        // "01234567" at version 1-M.
        let data = [
            0x10, 0x20, 0x0c, 0x56, 0x61, 0x80, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11,
            0xec, 0x11,
        ];
        let ecc = rs_encode(&data, 10);
        assert_eq!(ecc, vec![0xa5, 0x24, 0xd4, 0xc1, 0xed, 0x36, 0xc7, 0x87, 0x2c, 0x55]);
    }

    #[test]
    fn test_hello_world_1q() {
        let data = [32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236];
        let ecc = rs_encode(&data, 13);
        assert_eq!(ecc, vec![168, 72, 22, 82, 217, 54, 156, 0, 46, 15, 180, 122, 16]);
    }

    #[test]
    #[should_panic(expected = "Data block must not be empty")]
    fn test_empty_block_panics() {
        rs_encode(&[], 4);
    }
}

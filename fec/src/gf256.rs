//! Arithmetic in GF(2^8), the field the Reed-Solomon codec (§4.2, §9 Open
//! Questions — GF(2^8) is the chosen `rs_m`) operates over. Addition and
//! subtraction are XOR; multiplication and division go through log/exp
//! tables built once at first use, the standard trick for making per-byte
//! field ops a table lookup instead of polynomial reduction on every call.

use std::sync::OnceLock;

/// AES's primitive polynomial, x^8 + x^4 + x^3 + x^2 + 1. Any primitive
/// polynomial would do; this one is the most commonly seen across
/// Reed-Solomon implementations, which is reason enough to match it here.
const POLY: u16 = 0x11d;

struct Tables {
    exp: [u8; 512],
    log: [u8; 256],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255usize {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= POLY;
            }
        }
        for i in 255..512 {
            exp[i] = exp[i - 255];
        }
        Tables { exp, log }
    })
}

pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    let log_sum = t.log[a as usize] as usize + t.log[b as usize] as usize;
    t.exp[log_sum]
}

pub fn div(a: u8, b: u8) -> u8 {
    assert!(b != 0, "division by zero in GF(2^8)");
    if a == 0 {
        return 0;
    }
    let t = tables();
    let diff = t.log[a as usize] as i32 - t.log[b as usize] as i32;
    let idx = diff.rem_euclid(255) as usize;
    t.exp[idx]
}

pub fn inv(a: u8) -> u8 {
    assert!(a != 0, "zero has no inverse in GF(2^8)");
    div(1, a)
}

pub fn pow(a: u8, n: u32) -> u8 {
    if a == 0 {
        return if n == 0 { 1 } else { 0 };
    }
    let t = tables();
    let log_val = t.log[a as usize] as u32;
    let idx = ((log_val * n) % 255) as usize;
    t.exp[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_are_inverse() {
        for a in 1..=255u8 {
            for b in 1..=255u8 {
                assert_eq!(div(mul(a, b), b), a);
            }
        }
    }

    #[test]
    fn inv_roundtrips() {
        for a in 1..=255u8 {
            assert_eq!(mul(a, inv(a)), 1);
        }
    }

    #[test]
    fn mul_by_zero_is_zero() {
        assert_eq!(mul(0, 200), 0);
        assert_eq!(mul(200, 0), 0);
    }
}

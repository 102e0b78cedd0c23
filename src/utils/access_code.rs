//! 门禁码生成
//! 每位独立均匀抽取0-9，允许重复和前导零

use rand::Rng;

/// 门禁码位数
pub const ACCESS_CODE_LENGTH: usize = 6;

/// 生成6位数字门禁码
pub fn generate_access_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ACCESS_CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..=9u8)))
        .collect()
}

/// 检查门禁码格式（恰好6位ASCII数字）
pub fn is_valid_access_code(code: &str) -> bool {
    code.len() == ACCESS_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

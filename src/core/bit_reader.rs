use crate::core::error::{PlayerError, Result};

/// 比特级读取游标（只读字节缓冲区，高位在前）
pub struct BitReader<'a> {
    data: &'a [u8],
    /// 已消耗的比特数
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// 剩余比特数
    pub fn bits_left(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    /// 当前比特位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// 读取 n 位（n <= 32）
    pub fn get_bits(&mut self, n: usize) -> Result<u32> {
        if n > 32 {
            return Err(PlayerError::Bitstream(format!("单次最多读取 32 位，请求 {} 位", n)));
        }
        Ok(self.get_bits_u64(n)? as u32)
    }

    /// 读取 n 位（n <= 64）
    pub fn get_bits_u64(&mut self, n: usize) -> Result<u64> {
        if n > 64 {
            return Err(PlayerError::Bitstream(format!("单次最多读取 64 位，请求 {} 位", n)));
        }
        self.ensure(n)?;

        let mut value: u64 = 0;
        let mut remaining = n;
        while remaining > 0 {
            let byte = self.data[self.position / 8];
            let bit_offset = self.position % 8;
            let available = 8 - bit_offset;
            let take = available.min(remaining);
            let shift = available - take;
            let bits = (byte >> shift) & ((1u16 << take) - 1) as u8;

            value = (value << take) | bits as u64;
            remaining -= take;
            self.position += take;
        }
        Ok(value)
    }

    pub fn get_bool(&mut self) -> Result<bool> {
        Ok(self.get_bits(1)? == 1)
    }

    /// 跳过 n 位
    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.position += n;
        Ok(())
    }

    /// 对齐到下一个字节边界
    pub fn byte_align(&mut self) {
        self.position = (self.position + 7) / 8 * 8;
    }

    /// 无符号指数哥伦布码 ue(v)（H.264/H.265 参数集）
    pub fn read_ue(&mut self) -> Result<u32> {
        let mut leading_zeros = 0;
        while !self.get_bool()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(PlayerError::Bitstream("指数哥伦布码前导零过多".to_string()));
            }
        }
        if leading_zeros == 0 {
            return Ok(0);
        }
        let suffix = self.get_bits_u64(leading_zeros)?;
        Ok(((1u64 << leading_zeros) - 1 + suffix) as u32)
    }

    /// 有符号指数哥伦布码 se(v)
    pub fn read_se(&mut self) -> Result<i32> {
        let code = self.read_ue()? as i64;
        let value = if code % 2 == 1 { (code + 1) / 2 } else { -(code / 2) };
        Ok(value as i32)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.bits_left() {
            return Err(PlayerError::Bitstream(format!(
                "比特流不足: 需要 {} 位，剩余 {} 位",
                n,
                self.bits_left()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_bits_across_bytes() {
        let data = [0b1010_1100, 0b0101_0011, 0xFF];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.get_bits(3).unwrap(), 0b101);
        assert_eq!(reader.get_bits(7).unwrap(), 0b0_1100_01);
        assert_eq!(reader.bits_left(), 14);
        assert!(!reader.get_bool().unwrap());
        reader.byte_align();
        assert_eq!(reader.position(), 16);
        assert_eq!(reader.get_bits(8).unwrap(), 0xFF);
        assert_eq!(reader.bits_left(), 0);
    }

    #[test]
    fn test_overrun_is_error() {
        let data = [0xAB];
        let mut reader = BitReader::new(&data);
        reader.skip_bits(6).unwrap();
        assert!(matches!(reader.get_bits(3), Err(PlayerError::Bitstream(_))));
        // 失败的读取不移动游标
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.get_bits(2).unwrap(), 0b11);
    }

    #[test]
    fn test_get_bits_u64_full_width() {
        let data = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.get_bits_u64(64).unwrap(), 0x0123_4567_89AB_CDEF);
        assert!(reader.get_bits(33).is_err());
    }

    #[test]
    fn test_exp_golomb() {
        // 1 | 010 | 011 | 00100 | 00101 → ue: 0, 1, 2, 3, 4
        let data = [0b1010_0110, 0b0100_0010, 0b1000_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_ue().unwrap(), 0);
        assert_eq!(reader.read_ue().unwrap(), 1);
        assert_eq!(reader.read_ue().unwrap(), 2);
        assert_eq!(reader.read_ue().unwrap(), 3);
        assert_eq!(reader.read_ue().unwrap(), 4);

        // se: 010 → +1, 011 → -1
        let data = [0b0100_1100];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_se().unwrap(), 1);
        assert_eq!(reader.read_se().unwrap(), -1);
    }
}

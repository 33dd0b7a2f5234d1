//! Разбор полезной нагрузки ответа сонара в индексированные выборки.
//!
//! Ping360 отдаёт по байту на выборку; 16-битные буферы хранятся в порядке
//! big-endian (сетевая последовательность).

use byteorder::{BigEndian, ByteOrder};
use echosweep_types::{samples_from_intensities, IntensityFormat, Sample, SonarError, SonarResult};

/// Декодирует полезную нагрузку в выборки, индексируя их по порядку.
pub fn decode_intensities(
    payload: &[u8],
    format: IntensityFormat,
) -> SonarResult<Vec<Sample>> {
    let width = format.sample_size();

    if payload.len() % width != 0 {
        return Err(SonarError::FormatViolation(format!(
            "{format:?} payload length {} is not a multiple of {width}",
            payload.len()
        )));
    }

    match format {
        IntensityFormat::U8 => Ok(payload
            .iter()
            .enumerate()
            .map(|(i, &b)| Sample::new(b as u16, i as u32))
            .collect()),
        IntensityFormat::U16Be => {
            let mut words = vec![0u16; payload.len() / width];
            BigEndian::read_u16_into(payload, &mut words);

            Ok(samples_from_intensities(&words))
        }
    }
}

/// Кодирует интенсивности в полезную нагрузку заданного формата.
///
/// Для `U8` значения выше 255 насыщаются.
pub fn encode_intensities(
    intensities: &[u16],
    format: IntensityFormat,
) -> Vec<u8> {
    match format {
        IntensityFormat::U8 => intensities.iter().map(|&v| v.min(255) as u8).collect(),
        IntensityFormat::U16Be => {
            let mut buf = vec![0u8; intensities.len() * format.sample_size()];
            BigEndian::write_u16_into(intensities, &mut buf);
            buf
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_u8_indexes_in_order() {
        let samples = decode_intensities(&[0, 7, 255], IntensityFormat::U8).unwrap();

        assert_eq!(
            samples,
            vec![Sample::new(0, 0), Sample::new(7, 1), Sample::new(255, 2)]
        );
    }

    #[test]
    fn test_decode_u16_big_endian() {
        let samples = decode_intensities(&[0x01, 0x02, 0xff, 0xfe], IntensityFormat::U16Be).unwrap();

        assert_eq!(samples[0], Sample::new(0x0102, 0));
        assert_eq!(samples[1], Sample::new(0xfffe, 1));
    }

    #[test]
    fn test_decode_u16_odd_length() {
        let err = decode_intensities(&[0x01, 0x02, 0x03], IntensityFormat::U16Be).unwrap_err();
        assert!(matches!(err, SonarError::FormatViolation(_)));
    }

    #[test]
    fn test_encoded_length_follows_sample_size() {
        let intensities = [10u16, 20, 30];

        for format in [IntensityFormat::U8, IntensityFormat::U16Be] {
            let payload = encode_intensities(&intensities, format);
            assert_eq!(payload.len(), intensities.len() * format.sample_size());

            let decoded = decode_intensities(&payload[..payload.len() - 1], format);
            match format {
                IntensityFormat::U8 => assert_eq!(decoded.unwrap().len(), 2),
                IntensityFormat::U16Be => {
                    assert!(matches!(decoded, Err(SonarError::FormatViolation(_))))
                }
            }
        }
    }

    #[test]
    fn test_encode_u8_saturates() {
        assert_eq!(
            encode_intensities(&[3, 255, 256, 60_000], IntensityFormat::U8),
            vec![3, 255, 255, 255]
        );
    }

    #[test]
    fn test_encode_u16_layout() {
        assert_eq!(
            encode_intensities(&[0x0102, 0xa0b0], IntensityFormat::U16Be),
            vec![0x01, 0x02, 0xa0, 0xb0]
        );
    }

    #[test]
    fn test_empty_payload() {
        assert!(decode_intensities(&[], IntensityFormat::U8)
            .unwrap()
            .is_empty());
        assert!(decode_intensities(&[], IntensityFormat::U16Be)
            .unwrap()
            .is_empty());
    }
}

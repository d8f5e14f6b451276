use super::{EclData, EclFileError, EclFileResult, EclKeyword, EclType};

const HEADER_LEN: usize = 16;
const TRUE_VALUE: i32 = -1;

struct RecordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    fn at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn take(&mut self, len: usize, context: &str) -> EclFileResult<&'a [u8]> {
        let end = self.offset.checked_add(len).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(EclFileError::Truncated {
                context: context.to_string(),
            });
        };
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn marker(&mut self, context: &str) -> EclFileResult<i32> {
        let raw = self.take(4, context)?;
        Ok(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn record(&mut self, context: &str) -> EclFileResult<&'a [u8]> {
        let head = self.marker(context)?;
        let len = usize::try_from(head).map_err(|_| EclFileError::RecordMarker { head, tail: head })?;
        let payload = self.take(len, context)?;
        let tail = self.marker(context)?;
        if head != tail {
            return Err(EclFileError::RecordMarker { head, tail });
        }
        Ok(payload)
    }
}

pub(super) fn read_keywords(bytes: &[u8]) -> EclFileResult<Vec<EclKeyword>> {
    let mut reader = RecordReader { bytes, offset: 0 };
    let mut keywords = Vec::new();

    while !reader.at_end() {
        let header = reader.record("keyword header")?;
        if header.len() != HEADER_LEN {
            return Err(EclFileError::Truncated {
                context: format!("keyword header of {} bytes", header.len()),
            });
        }
        let name = String::from_utf8_lossy(&header[0..8]).trim_end().to_string();
        let declared = i32::from_be_bytes([header[8], header[9], header[10], header[11]]);
        let ecl_type = EclType::from_tag(&String::from_utf8_lossy(&header[12..16]))?;
        let count = usize::try_from(declared).map_err(|_| EclFileError::InvalidValue {
            keyword: name.clone(),
            value: declared.to_string(),
        })?;

        let mut payload = Vec::with_capacity(count * ecl_type.element_size());
        let mut remaining = if ecl_type == EclType::Mess { 0 } else { count };
        while remaining > 0 {
            let block = reader.record(&name)?;
            let elements = block.len() / ecl_type.element_size().max(1);
            if elements == 0 || elements > remaining {
                return Err(EclFileError::CountMismatch {
                    keyword: name,
                    declared: count,
                    found: count - remaining + elements,
                });
            }
            payload.extend_from_slice(block);
            remaining -= elements;
        }

        let data = decode(ecl_type, &payload);
        keywords.push(EclKeyword { name, data });
    }

    Ok(keywords)
}

fn decode(ecl_type: EclType, payload: &[u8]) -> EclData {
    let words4 = || {
        payload
            .chunks_exact(4)
            .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
    };
    match ecl_type {
        EclType::Inte => EclData::Int(words4().map(i32::from_be_bytes).collect()),
        EclType::Real => EclData::Real(words4().map(f32::from_be_bytes).collect()),
        EclType::Logi => EclData::Logical(words4().map(|word| i32::from_be_bytes(word) != 0).collect()),
        EclType::Doub => EclData::Double(
            payload
                .chunks_exact(8)
                .map(|chunk| {
                    let mut word = [0u8; 8];
                    word.copy_from_slice(chunk);
                    f64::from_be_bytes(word)
                })
                .collect(),
        ),
        EclType::Char => EclData::Char(
            payload
                .chunks_exact(8)
                .map(|chunk| String::from_utf8_lossy(chunk).trim_end().to_string())
                .collect(),
        ),
        EclType::Mess => EclData::Message,
    }
}

fn push_record(out: &mut Vec<u8>, payload: &[u8]) {
    // Payloads are bounded by the block size, so the length always fits.
    let len = payload.len() as i32;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&len.to_be_bytes());
}

fn fixed_width(text: &str) -> [u8; 8] {
    let mut field = [b' '; 8];
    for (slot, byte) in field.iter_mut().zip(text.bytes()) {
        *slot = byte;
    }
    field
}

pub(super) fn write_keywords(keywords: &[EclKeyword]) -> EclFileResult<Vec<u8>> {
    let mut out = Vec::new();
    for keyword in keywords {
        if keyword.name.len() > 8 {
            return Err(EclFileError::NameTooLong(keyword.name.clone()));
        }
        let ecl_type = keyword.data.ecl_type();
        let count = i32::try_from(keyword.data.len()).map_err(|_| EclFileError::InvalidValue {
            keyword: keyword.name.clone(),
            value: keyword.data.len().to_string(),
        })?;

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(&fixed_width(&keyword.name));
        header.extend_from_slice(&count.to_be_bytes());
        header.extend_from_slice(ecl_type.tag().as_bytes());
        push_record(&mut out, &header);

        let encoded = encode(&keyword.data);
        let block_bytes = ecl_type.block_size() * ecl_type.element_size();
        if block_bytes > 0 {
            for block in encoded.chunks(block_bytes) {
                push_record(&mut out, block);
            }
        }
    }
    Ok(out)
}

fn encode(data: &EclData) -> Vec<u8> {
    match data {
        EclData::Int(values) => values.iter().flat_map(|value| value.to_be_bytes()).collect(),
        EclData::Real(values) => values.iter().flat_map(|value| value.to_be_bytes()).collect(),
        EclData::Double(values) => values.iter().flat_map(|value| value.to_be_bytes()).collect(),
        EclData::Logical(values) => values
            .iter()
            .flat_map(|value| (if *value { TRUE_VALUE } else { 0 }).to_be_bytes())
            .collect(),
        EclData::Char(values) => values.iter().flat_map(|value| fixed_width(value)).collect(),
        EclData::Message => Vec::new(),
    }
}

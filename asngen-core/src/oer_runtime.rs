//! OER runtime: the static C helpers generated OER code calls.
//!
//! Each helper is emitted at most once, after its dependencies, and only
//! when some generated function (or another used helper) calls it.

use crate::assembler::RuntimeHelper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OerHelper {
    MinimumUintLength,
    MinimumIntLength,
    EncoderCore,
    AppendBytes,
    AppendUint,
    AppendInt,
    AppendBool,
    AppendFloat,
    AppendDouble,
    AppendLengthDeterminant,
    AppendQuantity,
    AppendEnumerated,
    DecoderCore,
    ReadBytes,
    ReadUint,
    ReadInt,
    ReadBool,
    ReadFloat,
    ReadDouble,
    ReadLengthDeterminant,
    ReadQuantity,
    ReadEnumerated,
    ReadTag,
}

impl RuntimeHelper for OerHelper {
    const CORE: &'static [Self] = &[OerHelper::EncoderCore, OerHelper::DecoderCore];

    fn dependencies(self) -> &'static [Self] {
        use OerHelper::*;

        match self {
            MinimumUintLength | MinimumIntLength | EncoderCore | DecoderCore => &[],
            AppendBytes | AppendUint => &[EncoderCore],
            AppendInt | AppendBool | AppendFloat | AppendDouble => &[AppendUint],
            AppendLengthDeterminant => &[MinimumUintLength, AppendUint],
            AppendQuantity => &[MinimumUintLength, AppendUint, AppendLengthDeterminant],
            AppendEnumerated => &[MinimumIntLength, AppendUint, AppendInt],
            ReadBytes | ReadUint => &[DecoderCore],
            ReadInt | ReadBool | ReadFloat | ReadDouble | ReadLengthDeterminant | ReadTag => {
                &[ReadUint]
            }
            ReadQuantity => &[ReadUint, ReadLengthDeterminant],
            ReadEnumerated => &[ReadUint, ReadInt],
        }
    }

    fn source(self) -> &'static str {
        match self {
            OerHelper::MinimumUintLength => MINIMUM_UINT_LENGTH,
            OerHelper::MinimumIntLength => MINIMUM_INT_LENGTH,
            OerHelper::EncoderCore => ENCODER_CORE,
            OerHelper::AppendBytes => APPEND_BYTES,
            OerHelper::AppendUint => APPEND_UINT,
            OerHelper::AppendInt => APPEND_INT,
            OerHelper::AppendBool => APPEND_BOOL,
            OerHelper::AppendFloat => APPEND_FLOAT,
            OerHelper::AppendDouble => APPEND_DOUBLE,
            OerHelper::AppendLengthDeterminant => APPEND_LENGTH_DETERMINANT,
            OerHelper::AppendQuantity => APPEND_QUANTITY,
            OerHelper::AppendEnumerated => APPEND_ENUMERATED,
            OerHelper::DecoderCore => DECODER_CORE,
            OerHelper::ReadBytes => READ_BYTES,
            OerHelper::ReadUint => READ_UINT,
            OerHelper::ReadInt => READ_INT,
            OerHelper::ReadBool => READ_BOOL,
            OerHelper::ReadFloat => READ_FLOAT,
            OerHelper::ReadDouble => READ_DOUBLE,
            OerHelper::ReadLengthDeterminant => READ_LENGTH_DETERMINANT,
            OerHelper::ReadQuantity => READ_QUANTITY,
            OerHelper::ReadEnumerated => READ_ENUMERATED,
            OerHelper::ReadTag => READ_TAG,
        }
    }
}

const MINIMUM_UINT_LENGTH: &str = r#"static int minimum_uint_length(uint64_t value)
{
    int length;

    length = 1;

    while (value > 255) {
        length++;
        value >>= 8;
    }

    return (length);
}
"#;

const MINIMUM_INT_LENGTH: &str = r#"static int minimum_int_length(int64_t value)
{
    int length;

    length = 1;

    while ((length < 8)
           && ((value < -(INT64_C(1) << (8 * length - 1)))
               || (value >= (INT64_C(1) << (8 * length - 1))))) {
        length++;
    }

    return (length);
}
"#;

const ENCODER_CORE: &str = r#"struct encoder_t {
    uint8_t *buf_p;
    ssize_t size;
    ssize_t pos;
};

static void encoder_init(struct encoder_t *self_p,
                         uint8_t *buf_p,
                         size_t size)
{
    self_p->buf_p = buf_p;
    self_p->size = (ssize_t)size;
    self_p->pos = 0;
}

static ssize_t encoder_get_result(const struct encoder_t *self_p)
{
    return (self_p->pos);
}

static void encoder_abort(struct encoder_t *self_p,
                          ssize_t error)
{
    if (self_p->size >= 0) {
        self_p->size = -error;
        self_p->pos = -error;
    }
}

static ssize_t encoder_alloc(struct encoder_t *self_p,
                             size_t size)
{
    ssize_t pos;

    if ((self_p->pos >= 0) && (self_p->pos + (ssize_t)size <= self_p->size)) {
        pos = self_p->pos;
        self_p->pos += (ssize_t)size;
    } else {
        pos = -ENOMEM;
        encoder_abort(self_p, ENOMEM);
    }

    return (pos);
}
"#;

const APPEND_BYTES: &str = r#"static void encoder_append_bytes(struct encoder_t *self_p,
                                 const uint8_t *buf_p,
                                 size_t size)
{
    ssize_t pos;

    pos = encoder_alloc(self_p, size);

    if (pos < 0) {
        return;
    }

    memcpy(&self_p->buf_p[pos], buf_p, size);
}
"#;

const APPEND_UINT: &str = r#"static void encoder_append_uint(struct encoder_t *self_p,
                                uint64_t value,
                                int number_of_bytes)
{
    ssize_t pos;
    int i;

    pos = encoder_alloc(self_p, (size_t)number_of_bytes);

    if (pos < 0) {
        return;
    }

    for (i = number_of_bytes - 1; i >= 0; i--) {
        self_p->buf_p[pos + i] = (uint8_t)value;
        value >>= 8;
    }
}
"#;

const APPEND_INT: &str = r#"static void encoder_append_int(struct encoder_t *self_p,
                               int64_t value,
                               int number_of_bytes)
{
    encoder_append_uint(self_p, (uint64_t)value, number_of_bytes);
}
"#;

const APPEND_BOOL: &str = r#"static void encoder_append_bool(struct encoder_t *self_p, bool value)
{
    encoder_append_uint(self_p, value ? 255 : 0, 1);
}
"#;

const APPEND_FLOAT: &str = r#"static void encoder_append_float(struct encoder_t *self_p, float value)
{
    uint32_t data;

    memcpy(&data, &value, sizeof(data));
    encoder_append_uint(self_p, data, 4);
}
"#;

const APPEND_DOUBLE: &str = r#"static void encoder_append_double(struct encoder_t *self_p, double value)
{
    uint64_t data;

    memcpy(&data, &value, sizeof(data));
    encoder_append_uint(self_p, data, 8);
}
"#;

const APPEND_LENGTH_DETERMINANT: &str = r#"static void encoder_append_length_determinant(struct encoder_t *self_p,
                                              uint64_t length)
{
    int number_of_bytes;

    if (length < 128) {
        encoder_append_uint(self_p, length, 1);
    } else {
        number_of_bytes = minimum_uint_length(length);
        encoder_append_uint(self_p, 0x80u | (uint64_t)number_of_bytes, 1);
        encoder_append_uint(self_p, length, number_of_bytes);
    }
}
"#;

const APPEND_QUANTITY: &str = r#"static void encoder_append_quantity(struct encoder_t *self_p,
                                    uint64_t quantity)
{
    int number_of_bytes;

    number_of_bytes = minimum_uint_length(quantity);
    encoder_append_length_determinant(self_p, (uint64_t)number_of_bytes);
    encoder_append_uint(self_p, quantity, number_of_bytes);
}
"#;

const APPEND_ENUMERATED: &str = r#"static void encoder_append_enumerated(struct encoder_t *self_p,
                                      int64_t value)
{
    int number_of_bytes;

    if ((value >= 0) && (value < 128)) {
        encoder_append_uint(self_p, (uint64_t)value, 1);
    } else {
        number_of_bytes = minimum_int_length(value);
        encoder_append_uint(self_p, 0x80u | (uint64_t)number_of_bytes, 1);
        encoder_append_int(self_p, value, number_of_bytes);
    }
}
"#;

const DECODER_CORE: &str = r#"struct decoder_t {
    const uint8_t *buf_p;
    ssize_t size;
    ssize_t pos;
};

static void decoder_init(struct decoder_t *self_p,
                         const uint8_t *buf_p,
                         size_t size)
{
    self_p->buf_p = buf_p;
    self_p->size = (ssize_t)size;
    self_p->pos = 0;
}

static ssize_t decoder_get_result(const struct decoder_t *self_p)
{
    return (self_p->pos);
}

static void decoder_abort(struct decoder_t *self_p,
                          ssize_t error)
{
    if (self_p->size >= 0) {
        self_p->size = -error;
        self_p->pos = -error;
    }
}

static ssize_t decoder_free(struct decoder_t *self_p,
                            size_t size)
{
    ssize_t pos;

    if ((self_p->pos >= 0) && (self_p->pos + (ssize_t)size <= self_p->size)) {
        pos = self_p->pos;
        self_p->pos += (ssize_t)size;
    } else {
        pos = -EOUTOFDATA;
        decoder_abort(self_p, EOUTOFDATA);
    }

    return (pos);
}
"#;

const READ_BYTES: &str = r#"static void decoder_read_bytes(struct decoder_t *self_p,
                               uint8_t *buf_p,
                               size_t size)
{
    ssize_t pos;

    pos = decoder_free(self_p, size);

    if (pos < 0) {
        return;
    }

    memcpy(buf_p, &self_p->buf_p[pos], size);
}
"#;

const READ_UINT: &str = r#"static uint64_t decoder_read_uint(struct decoder_t *self_p,
                                  int number_of_bytes)
{
    uint64_t value;
    ssize_t pos;
    int i;

    pos = decoder_free(self_p, (size_t)number_of_bytes);

    if (pos < 0) {
        return (0);
    }

    value = 0;

    for (i = 0; i < number_of_bytes; i++) {
        value <<= 8;
        value |= self_p->buf_p[pos + i];
    }

    return (value);
}
"#;

const READ_INT: &str = r#"static int64_t decoder_read_int(struct decoder_t *self_p,
                                int number_of_bytes)
{
    uint64_t value;

    value = decoder_read_uint(self_p, number_of_bytes);

    if ((number_of_bytes < 8)
        && ((value & (UINT64_C(1) << (8 * number_of_bytes - 1))) != 0)) {
        value |= ~UINT64_C(0) << (8 * number_of_bytes);
    }

    return ((int64_t)value);
}
"#;

const READ_BOOL: &str = r#"static bool decoder_read_bool(struct decoder_t *self_p)
{
    return (decoder_read_uint(self_p, 1) != 0);
}
"#;

const READ_FLOAT: &str = r#"static float decoder_read_float(struct decoder_t *self_p)
{
    uint32_t data;
    float value;

    data = (uint32_t)decoder_read_uint(self_p, 4);
    memcpy(&value, &data, sizeof(value));

    return (value);
}
"#;

const READ_DOUBLE: &str = r#"static double decoder_read_double(struct decoder_t *self_p)
{
    uint64_t data;
    double value;

    data = decoder_read_uint(self_p, 8);
    memcpy(&value, &data, sizeof(value));

    return (value);
}
"#;

const READ_LENGTH_DETERMINANT: &str = r#"static uint64_t decoder_read_length_determinant(struct decoder_t *self_p)
{
    uint64_t length;
    int number_of_bytes;

    length = decoder_read_uint(self_p, 1);

    if ((length & 0x80u) != 0) {
        number_of_bytes = (int)(length & 0x7fu);

        if ((number_of_bytes == 0) || (number_of_bytes > 8)) {
            decoder_abort(self_p, EBADLENGTH);

            return (0);
        }

        length = decoder_read_uint(self_p, number_of_bytes);
    }

    return (length);
}
"#;

const READ_QUANTITY: &str = r#"static uint64_t decoder_read_quantity(struct decoder_t *self_p)
{
    uint64_t number_of_bytes;

    number_of_bytes = decoder_read_length_determinant(self_p);

    if ((number_of_bytes == 0) || (number_of_bytes > 8)) {
        decoder_abort(self_p, EBADLENGTH);

        return (0);
    }

    return (decoder_read_uint(self_p, (int)number_of_bytes));
}
"#;

const READ_ENUMERATED: &str = r#"static int64_t decoder_read_enumerated(struct decoder_t *self_p)
{
    uint64_t first;
    int number_of_bytes;

    first = decoder_read_uint(self_p, 1);

    if ((first & 0x80u) == 0) {
        return ((int64_t)first);
    }

    number_of_bytes = (int)(first & 0x7fu);

    if ((number_of_bytes == 0) || (number_of_bytes > 8)) {
        decoder_abort(self_p, EBADENUM);

        return (0);
    }

    return (decoder_read_int(self_p, number_of_bytes));
}
"#;

/// Returns the tag octets as read, so generated code compares against the
/// same octets it writes.
const READ_TAG: &str = r#"static uint64_t decoder_read_tag(struct decoder_t *self_p)
{
    uint64_t tag;
    uint64_t byte;
    int length;

    tag = decoder_read_uint(self_p, 1);

    if ((tag & 0x3fu) == 0x3fu) {
        length = 1;

        do {
            byte = decoder_read_uint(self_p, 1);
            tag <<= 8;
            tag |= byte;
            length++;
        } while (((byte & 0x80u) != 0) && (length < 8));
    }

    return (tag);
}
"#;

/// Tag octets of a context-specific tag with number `number`.
pub fn tag_octets(number: u32) -> Vec<u8> {
    if number < 63 {
        return vec![0x80 | number as u8];
    }

    let mut groups = Vec::new();
    let mut value = number;
    loop {
        groups.push((value & 0x7f) as u8);
        value >>= 7;
        if value == 0 {
            break;
        }
    }

    let mut octets = vec![0xbf];
    for (i, group) in groups.iter().enumerate().rev() {
        octets.push(if i > 0 { group | 0x80 } else { *group });
    }
    octets
}

/// The tag octets as one big-endian number, the value `decoder_read_tag`
/// returns.
pub fn tag_value(number: u32) -> u64 {
    tag_octets(number)
        .into_iter()
        .fold(0, |value, octet| (value << 8) | u64::from(octet))
}

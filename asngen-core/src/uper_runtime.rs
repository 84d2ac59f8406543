//! UPER runtime: bit-level static C helpers.
//!
//! Encoder and decoder positions count bits. The encoder clears the output
//! buffer up front and only ever sets bits.

use crate::assembler::RuntimeHelper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UperHelper {
    EncoderCore,
    AppendBit,
    AppendBool,
    AppendNonNegativeBinaryInteger,
    AppendBytes,
    AppendBits,
    AppendSevenBitChars,
    DecoderCore,
    ReadBit,
    ReadBool,
    ReadNonNegativeBinaryInteger,
    ReadBytes,
    ReadBits,
    ReadSevenBitChars,
}

impl RuntimeHelper for UperHelper {
    const CORE: &'static [Self] = &[UperHelper::EncoderCore, UperHelper::DecoderCore];

    fn dependencies(self) -> &'static [Self] {
        use UperHelper::*;

        match self {
            EncoderCore | DecoderCore => &[],
            AppendBit => &[EncoderCore],
            AppendBool | AppendNonNegativeBinaryInteger | AppendBits => &[AppendBit],
            AppendBytes | AppendSevenBitChars => &[AppendNonNegativeBinaryInteger],
            ReadBit => &[DecoderCore],
            ReadBool | ReadNonNegativeBinaryInteger | ReadBits => &[ReadBit],
            ReadBytes | ReadSevenBitChars => &[ReadNonNegativeBinaryInteger],
        }
    }

    fn source(self) -> &'static str {
        match self {
            UperHelper::EncoderCore => ENCODER_CORE,
            UperHelper::AppendBit => APPEND_BIT,
            UperHelper::AppendBool => APPEND_BOOL,
            UperHelper::AppendNonNegativeBinaryInteger => APPEND_NON_NEGATIVE_BINARY_INTEGER,
            UperHelper::AppendBytes => APPEND_BYTES,
            UperHelper::AppendBits => APPEND_BITS,
            UperHelper::AppendSevenBitChars => APPEND_SEVEN_BIT_CHARS,
            UperHelper::DecoderCore => DECODER_CORE,
            UperHelper::ReadBit => READ_BIT,
            UperHelper::ReadBool => READ_BOOL,
            UperHelper::ReadNonNegativeBinaryInteger => READ_NON_NEGATIVE_BINARY_INTEGER,
            UperHelper::ReadBytes => READ_BYTES,
            UperHelper::ReadBits => READ_BITS,
            UperHelper::ReadSevenBitChars => READ_SEVEN_BIT_CHARS,
        }
    }
}

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
    self_p->size = (8 * (ssize_t)size);
    self_p->pos = 0;
    memset(buf_p, 0, size);
}

static ssize_t encoder_get_result(const struct encoder_t *self_p)
{
    if (self_p->pos < 0) {
        return (self_p->pos);
    }

    return ((self_p->pos + 7) / 8);
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

const APPEND_BIT: &str = r#"static void encoder_append_bit(struct encoder_t *self_p, int value)
{
    ssize_t pos;

    pos = encoder_alloc(self_p, 1);

    if (pos < 0) {
        return;
    }

    self_p->buf_p[pos / 8] |= (uint8_t)(value << (7 - (pos % 8)));
}
"#;

const APPEND_BOOL: &str = r#"static void encoder_append_bool(struct encoder_t *self_p, bool value)
{
    encoder_append_bit(self_p, value ? 1 : 0);
}
"#;

const APPEND_NON_NEGATIVE_BINARY_INTEGER: &str = r#"static void encoder_append_non_negative_binary_integer(struct encoder_t *self_p,
                                                       uint64_t value,
                                                       size_t size)
{
    size_t i;

    for (i = 0; i < size; i++) {
        encoder_append_bit(self_p, (int)((value >> (size - i - 1)) & 1));
    }
}
"#;

const APPEND_BYTES: &str = r#"static void encoder_append_bytes(struct encoder_t *self_p,
                                 const uint8_t *buf_p,
                                 size_t size)
{
    size_t i;

    for (i = 0; i < size; i++) {
        encoder_append_non_negative_binary_integer(self_p, buf_p[i], 8);
    }
}
"#;

const APPEND_BITS: &str = r#"static void encoder_append_bits(struct encoder_t *self_p,
                                const uint8_t *buf_p,
                                size_t number_of_bits)
{
    size_t i;

    for (i = 0; i < number_of_bits; i++) {
        encoder_append_bit(self_p, (buf_p[i / 8] >> (7 - (i % 8))) & 1);
    }
}
"#;

const APPEND_SEVEN_BIT_CHARS: &str = r#"static void encoder_append_seven_bit_chars(struct encoder_t *self_p,
                                           const uint8_t *buf_p,
                                           size_t size)
{
    size_t i;

    for (i = 0; i < size; i++) {
        if (buf_p[i] > 0x7f) {
            encoder_abort(self_p, EBADVALUE);

            return;
        }

        encoder_append_non_negative_binary_integer(self_p, buf_p[i], 7);
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
    self_p->size = (8 * (ssize_t)size);
    self_p->pos = 0;
}

static ssize_t decoder_get_result(const struct decoder_t *self_p)
{
    if (self_p->pos < 0) {
        return (self_p->pos);
    }

    return ((self_p->pos + 7) / 8);
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

const READ_BIT: &str = r#"static int decoder_read_bit(struct decoder_t *self_p)
{
    ssize_t pos;

    pos = decoder_free(self_p, 1);

    if (pos < 0) {
        return (0);
    }

    return ((self_p->buf_p[pos / 8] >> (7 - (pos % 8))) & 1);
}
"#;

const READ_BOOL: &str = r#"static bool decoder_read_bool(struct decoder_t *self_p)
{
    return (decoder_read_bit(self_p) != 0);
}
"#;

const READ_NON_NEGATIVE_BINARY_INTEGER: &str = r#"static uint64_t decoder_read_non_negative_binary_integer(struct decoder_t *self_p,
                                                         size_t size)
{
    uint64_t value;
    size_t i;

    value = 0;

    for (i = 0; i < size; i++) {
        value <<= 1;
        value |= (uint64_t)decoder_read_bit(self_p);
    }

    return (value);
}
"#;

const READ_BYTES: &str = r#"static void decoder_read_bytes(struct decoder_t *self_p,
                               uint8_t *buf_p,
                               size_t size)
{
    size_t i;

    for (i = 0; i < size; i++) {
        buf_p[i] = (uint8_t)decoder_read_non_negative_binary_integer(self_p, 8);
    }
}
"#;

const READ_BITS: &str = r#"static void decoder_read_bits(struct decoder_t *self_p,
                              uint8_t *buf_p,
                              size_t number_of_bits)
{
    size_t i;

    for (i = 0; i < number_of_bits; i++) {
        if (decoder_read_bit(self_p) != 0) {
            buf_p[i / 8] |= (uint8_t)(0x80u >> (i % 8));
        }
    }
}
"#;

const READ_SEVEN_BIT_CHARS: &str = r#"static void decoder_read_seven_bit_chars(struct decoder_t *self_p,
                                         uint8_t *buf_p,
                                         size_t size)
{
    size_t i;

    for (i = 0; i < size; i++) {
        buf_p[i] = (uint8_t)decoder_read_non_negative_binary_integer(self_p, 7);
    }
}
"#;

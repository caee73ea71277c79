//! Catalog of PDF4me operations
//!
//! Every operation is one fixed endpoint under `api/v2/` with its own JSON
//! schema. The catalog only knows what is needed to drive an endpoint
//! generically: where input files go in the payload and what kind of
//! artifact comes back. Operation-specific options are passed through
//! opaquely by [`crate::request::OperationRequest`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

/// How input files map into the request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// One file as `docContent` + `docName`
    Document,
    /// Two or more files as a `docContent` array
    Documents,
    /// Exactly two files as `baseDocContent` / `layerDocContent`
    Overlay,
    /// One template as `templateFileData` + `templateFileName`
    Template,
    /// No file; everything comes from options (e.g. `text`, `webUrl`)
    None,
}

impl InputKind {
    /// Minimum and maximum number of input files
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            InputKind::Document | InputKind::Template => (1, Some(1)),
            InputKind::Documents => (2, None),
            InputKind::Overlay => (2, Some(2)),
            InputKind::None => (0, Some(0)),
        }
    }
}

/// What a successful response body contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "extension")]
pub enum OutputKind {
    /// A single file with the given extension
    File(&'static str),
    /// A single file of the same type as the input
    SameAsInput,
    /// JSON data (metadata, barcodes, extracted text...)
    Json,
    /// JSON envelope embedding several base64 documents
    Envelope,
}

/// Operation families, following the PDF4me documentation sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Barcode,
    Convert,
    Edit,
    Extract,
    Forms,
    Generate,
    Image,
    MergeSplit,
    Optimize,
    Organize,
    Pdf,
    Search,
    Security,
    Word,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Barcode => "barcode",
            Category::Convert => "convert",
            Category::Edit => "edit",
            Category::Extract => "extract",
            Category::Forms => "forms",
            Category::Generate => "generate",
            Category::Image => "image",
            Category::MergeSplit => "merge-split",
            Category::Optimize => "optimize",
            Category::Organize => "organize",
            Category::Pdf => "pdf",
            Category::Search => "search",
            Category::Security => "security",
            Category::Word => "word",
        };
        f.write_str(name)
    }
}

/// Static description of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationSpec {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub category: Category,
    pub input: InputKind,
    pub output: OutputKind,
    pub summary: &'static str,
}

/// A PDF4me endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Barcode
    AddBarcode,
    CreateBarcode,
    ReadBarcodes,
    ReadSwissQrBill,
    // Convert
    ConvertHtmlToPdf,
    ConvertJsonToExcel,
    ConvertMarkdownToPdf,
    ConvertPdfToExcel,
    ConvertPdfToPowerPoint,
    ConvertPdfToWord,
    ConvertToPdf,
    ConvertUrlToPdf,
    ConvertVisio,
    ConvertWordToPdfForm,
    CreatePdfA,
    FlattenPdf,
    LinearizePdf,
    // Edit
    AddAttachment,
    AddHtmlHeaderFooter,
    AddImageStamp,
    AddMargin,
    AddPageNumber,
    AddTextStamp,
    SignPdf,
    UpdateHyperlinkAnnotation,
    // Extract
    ClassifyDocument,
    ExtractAttachments,
    ExtractFormData,
    ExtractResources,
    ExtractTable,
    ExtractTextByExpression,
    ExtractTextFromWord,
    ParseDocument,
    // Search
    ConvertOcrPdf,
    FindAndReplace,
    // Forms
    AddFormField,
    FillPdfForm,
    // Generate
    CreateSwissQrBill,
    GenerateDocumentMultiple,
    GenerateDocumentSingle,
    // Word
    DisableTrackingChanges,
    EnableTrackingChanges,
    GetTrackingChanges,
    ReplaceTextWithImageInWord,
    // Image
    AddImageWatermarkToImage,
    AddTextWatermarkToImage,
    CompressImage,
    ConvertImageFormat,
    CreateImages,
    CropImage,
    FlipImage,
    GetImageMetadata,
    ImageExtractText,
    ReadBarcodesFromImage,
    RemoveExifTags,
    ReplaceTextWithImage,
    ResizeImage,
    RotateImage,
    RotateImageByExif,
    // Merge and split
    Merge,
    MergeOverlay,
    SplitByBarcode,
    SplitByText,
    SplitPdf,
    // Optimize
    Compress,
    // Organize
    DeleteBlankPages,
    DeletePages,
    ExtractPages,
    RotateDocument,
    RotatePage,
    // PDF
    GetPdfMetadata,
    RepairPdf,
    // Security
    Protect,
    Unlock,
}

const ALL: &[Operation] = &[
    Operation::AddBarcode,
    Operation::CreateBarcode,
    Operation::ReadBarcodes,
    Operation::ReadSwissQrBill,
    Operation::ConvertHtmlToPdf,
    Operation::ConvertJsonToExcel,
    Operation::ConvertMarkdownToPdf,
    Operation::ConvertPdfToExcel,
    Operation::ConvertPdfToPowerPoint,
    Operation::ConvertPdfToWord,
    Operation::ConvertToPdf,
    Operation::ConvertUrlToPdf,
    Operation::ConvertVisio,
    Operation::ConvertWordToPdfForm,
    Operation::CreatePdfA,
    Operation::FlattenPdf,
    Operation::LinearizePdf,
    Operation::AddAttachment,
    Operation::AddHtmlHeaderFooter,
    Operation::AddImageStamp,
    Operation::AddMargin,
    Operation::AddPageNumber,
    Operation::AddTextStamp,
    Operation::SignPdf,
    Operation::UpdateHyperlinkAnnotation,
    Operation::ClassifyDocument,
    Operation::ExtractAttachments,
    Operation::ExtractFormData,
    Operation::ExtractResources,
    Operation::ExtractTable,
    Operation::ExtractTextByExpression,
    Operation::ExtractTextFromWord,
    Operation::ParseDocument,
    Operation::ConvertOcrPdf,
    Operation::FindAndReplace,
    Operation::AddFormField,
    Operation::FillPdfForm,
    Operation::CreateSwissQrBill,
    Operation::GenerateDocumentMultiple,
    Operation::GenerateDocumentSingle,
    Operation::DisableTrackingChanges,
    Operation::EnableTrackingChanges,
    Operation::GetTrackingChanges,
    Operation::ReplaceTextWithImageInWord,
    Operation::AddImageWatermarkToImage,
    Operation::AddTextWatermarkToImage,
    Operation::CompressImage,
    Operation::ConvertImageFormat,
    Operation::CreateImages,
    Operation::CropImage,
    Operation::FlipImage,
    Operation::GetImageMetadata,
    Operation::ImageExtractText,
    Operation::ReadBarcodesFromImage,
    Operation::RemoveExifTags,
    Operation::ReplaceTextWithImage,
    Operation::ResizeImage,
    Operation::RotateImage,
    Operation::RotateImageByExif,
    Operation::Merge,
    Operation::MergeOverlay,
    Operation::SplitByBarcode,
    Operation::SplitByText,
    Operation::SplitPdf,
    Operation::Compress,
    Operation::DeleteBlankPages,
    Operation::DeletePages,
    Operation::ExtractPages,
    Operation::RotateDocument,
    Operation::RotatePage,
    Operation::GetPdfMetadata,
    Operation::RepairPdf,
    Operation::Protect,
    Operation::Unlock,
];

const fn spec(
    name: &'static str,
    endpoint: &'static str,
    category: Category,
    input: InputKind,
    output: OutputKind,
    summary: &'static str,
) -> OperationSpec {
    OperationSpec {
        name,
        endpoint,
        category,
        input,
        output,
        summary,
    }
}

impl Operation {
    /// Every operation in catalog order
    pub fn all() -> &'static [Operation] {
        ALL
    }

    pub fn spec(&self) -> OperationSpec {
        use Category as C;
        use InputKind as I;
        use OutputKind as O;

        match self {
            Operation::AddBarcode => spec(
                "add-barcode",
                "api/v2/addbarcode",
                C::Barcode,
                I::Document,
                O::File("pdf"),
                "Stamp a barcode onto PDF pages",
            ),
            Operation::CreateBarcode => spec(
                "create-barcode",
                "api/v2/CreateBarcode",
                C::Barcode,
                I::None,
                O::File("png"),
                "Render a barcode image from text",
            ),
            Operation::ReadBarcodes => spec(
                "read-barcodes",
                "api/v2/ReadBarcodes",
                C::Barcode,
                I::Document,
                O::Json,
                "Read barcodes from a PDF",
            ),
            Operation::ReadSwissQrBill => spec(
                "read-swiss-qr-bill",
                "api/v2/ReadSwissQRBill",
                C::Barcode,
                I::Document,
                O::Json,
                "Read Swiss QR bill data from a PDF",
            ),
            Operation::ConvertHtmlToPdf => spec(
                "html-to-pdf",
                "api/v2/ConvertHtmlToPdf",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Convert an HTML document to PDF",
            ),
            Operation::ConvertJsonToExcel => spec(
                "json-to-excel",
                "api/v2/ConvertJsonToExcel",
                C::Convert,
                I::Document,
                O::File("xlsx"),
                "Convert JSON data to an Excel workbook",
            ),
            Operation::ConvertMarkdownToPdf => spec(
                "markdown-to-pdf",
                "api/v2/ConvertMdToPdf",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Convert Markdown to PDF",
            ),
            Operation::ConvertPdfToExcel => spec(
                "pdf-to-excel",
                "api/v2/ConvertPdfToExcel",
                C::Convert,
                I::Document,
                O::File("xlsx"),
                "Convert PDF tables to Excel",
            ),
            Operation::ConvertPdfToPowerPoint => spec(
                "pdf-to-powerpoint",
                "api/v2/ConvertPdfToPowerPoint",
                C::Convert,
                I::Document,
                O::File("pptx"),
                "Convert a PDF to PowerPoint",
            ),
            Operation::ConvertPdfToWord => spec(
                "pdf-to-word",
                "api/v2/ConvertPdfToWord",
                C::Convert,
                I::Document,
                O::File("docx"),
                "Convert a PDF to Word",
            ),
            Operation::ConvertToPdf => spec(
                "convert-to-pdf",
                "api/v2/ConvertToPdf",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Convert an Office document or image to PDF",
            ),
            Operation::ConvertUrlToPdf => spec(
                "url-to-pdf",
                "api/v2/ConvertUrlToPdf",
                C::Convert,
                I::None,
                O::File("pdf"),
                "Render a web page (webUrl option) to PDF",
            ),
            Operation::ConvertVisio => spec(
                "convert-visio",
                "api/v2/ConvertVisio",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Convert a Visio drawing",
            ),
            Operation::ConvertWordToPdfForm => spec(
                "word-to-pdf-form",
                "api/v2/ConvertWordToPdfForm",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Convert a Word document to a fillable PDF form",
            ),
            Operation::CreatePdfA => spec(
                "create-pdfa",
                "api/v2/PdfA",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Convert a PDF to PDF/A",
            ),
            Operation::FlattenPdf => spec(
                "flatten-pdf",
                "api/v2/FlattenPdf",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Flatten form fields and annotations",
            ),
            Operation::LinearizePdf => spec(
                "linearize-pdf",
                "api/v2/LinearizePdf",
                C::Convert,
                I::Document,
                O::File("pdf"),
                "Optimize a PDF for fast web view",
            ),
            Operation::AddAttachment => spec(
                "add-attachment",
                "api/v2/AddAttachmentToPdf",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Attach files to a PDF",
            ),
            Operation::AddHtmlHeaderFooter => spec(
                "add-html-header-footer",
                "api/v2/AddHtmlHeaderFooter",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Add an HTML header or footer",
            ),
            Operation::AddImageStamp => spec(
                "add-image-stamp",
                "api/v2/ImageStamp",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Stamp an image onto PDF pages",
            ),
            Operation::AddMargin => spec(
                "add-margin",
                "api/v2/AddMargin",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Add page margins",
            ),
            Operation::AddPageNumber => spec(
                "add-page-number",
                "api/v2/AddPageNumber",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Add page numbers",
            ),
            Operation::AddTextStamp => spec(
                "add-text-stamp",
                "api/v2/Stamp",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Stamp a text watermark onto PDF pages",
            ),
            Operation::SignPdf => spec(
                "sign-pdf",
                "api/v2/SignPdf",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Place a signature image on a PDF",
            ),
            Operation::UpdateHyperlinkAnnotation => spec(
                "update-hyperlinks",
                "api/v2/UpdateHyperlinkAnnotation",
                C::Edit,
                I::Document,
                O::File("pdf"),
                "Rewrite hyperlink annotations",
            ),
            Operation::ClassifyDocument => spec(
                "classify-document",
                "api/v2/ClassifyDocument",
                C::Extract,
                I::Document,
                O::Json,
                "Classify a document by its content",
            ),
            Operation::ExtractAttachments => spec(
                "extract-attachments",
                "api/v2/ExtractAttachmentFromPdf",
                C::Extract,
                I::Document,
                O::Envelope,
                "Extract embedded attachments",
            ),
            Operation::ExtractFormData => spec(
                "extract-form-data",
                "api/v2/ExtractPdfFormData",
                C::Extract,
                I::Document,
                O::Json,
                "Extract form field values",
            ),
            Operation::ExtractResources => spec(
                "extract-resources",
                "api/v2/ExtractResources",
                C::Extract,
                I::Document,
                O::Envelope,
                "Extract text and images",
            ),
            Operation::ExtractTable => spec(
                "extract-table",
                "api/v2/ExtractTableFromPdf",
                C::Extract,
                I::Document,
                O::Json,
                "Extract tables from a PDF",
            ),
            Operation::ExtractTextByExpression => spec(
                "extract-text-by-expression",
                "api/v2/ExtractTextByExpression",
                C::Extract,
                I::Document,
                O::Json,
                "Extract text matching an expression",
            ),
            Operation::ExtractTextFromWord => spec(
                "extract-text-from-word",
                "api/v2/ExtractTextFromWord",
                C::Extract,
                I::Document,
                O::Json,
                "Extract text from a Word document",
            ),
            Operation::ParseDocument => spec(
                "parse-document",
                "api/v2/ParseDocument",
                C::Extract,
                I::Document,
                O::Json,
                "Parse a document with a template",
            ),
            Operation::ConvertOcrPdf => spec(
                "ocr-pdf",
                "api/v2/ConvertOcrPdf",
                C::Search,
                I::Document,
                O::File("pdf"),
                "Make a scanned PDF searchable with OCR",
            ),
            Operation::FindAndReplace => spec(
                "find-and-replace",
                "api/v2/FindAndReplace",
                C::Search,
                I::Document,
                O::File("pdf"),
                "Find and replace text in a PDF",
            ),
            Operation::AddFormField => spec(
                "add-form-field",
                "api/v2/AddFormField",
                C::Forms,
                I::Document,
                O::File("pdf"),
                "Add form fields to a PDF",
            ),
            Operation::FillPdfForm => spec(
                "fill-pdf-form",
                "api/v2/FillPdfForm",
                C::Forms,
                I::Document,
                O::File("pdf"),
                "Fill PDF form fields",
            ),
            Operation::CreateSwissQrBill => spec(
                "create-swiss-qr-bill",
                "api/v2/CreateSwissQrBill",
                C::Generate,
                I::Document,
                O::File("pdf"),
                "Add a Swiss QR bill to a PDF",
            ),
            Operation::GenerateDocumentMultiple => spec(
                "generate-documents",
                "api/v2/GenerateDocumentMultiple",
                C::Generate,
                I::Template,
                O::Envelope,
                "Generate documents from a template and a data set",
            ),
            Operation::GenerateDocumentSingle => spec(
                "generate-document",
                "api/v2/GenerateDocumentSingle",
                C::Generate,
                I::Template,
                O::File("pdf"),
                "Generate one document from a template",
            ),
            Operation::DisableTrackingChanges => spec(
                "disable-tracking-changes",
                "api/v2/DisableTrackingChangesInWord",
                C::Word,
                I::Document,
                O::File("docx"),
                "Turn off track changes in Word",
            ),
            Operation::EnableTrackingChanges => spec(
                "enable-tracking-changes",
                "api/v2/EnableTrackingChangesInWord",
                C::Word,
                I::Document,
                O::File("docx"),
                "Turn on track changes in Word",
            ),
            Operation::GetTrackingChanges => spec(
                "get-tracking-changes",
                "api/v2/GetTrackingChangesInWord",
                C::Word,
                I::Document,
                O::Json,
                "List tracked changes in Word",
            ),
            Operation::ReplaceTextWithImageInWord => spec(
                "replace-text-with-image-in-word",
                "api/v2/ReplaceTextWithImageInWord",
                C::Word,
                I::Document,
                O::File("docx"),
                "Replace text with an image in Word",
            ),
            Operation::AddImageWatermarkToImage => spec(
                "add-image-watermark-to-image",
                "api/v2/AddImageWatermarkToImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Watermark an image with another image",
            ),
            Operation::AddTextWatermarkToImage => spec(
                "add-text-watermark-to-image",
                "api/v2/AddTextWatermarkToImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Watermark an image with text",
            ),
            Operation::CompressImage => spec(
                "compress-image",
                "api/v2/CompressImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Compress an image",
            ),
            Operation::ConvertImageFormat => spec(
                "convert-image-format",
                "api/v2/ConvertImageFormat",
                C::Image,
                I::Document,
                O::File("png"),
                "Convert between image formats",
            ),
            Operation::CreateImages => spec(
                "create-images",
                "api/v2/CreateImages",
                C::Image,
                I::Document,
                O::Envelope,
                "Render PDF pages as images",
            ),
            Operation::CropImage => spec(
                "crop-image",
                "api/v2/CropImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Crop an image",
            ),
            Operation::FlipImage => spec(
                "flip-image",
                "api/v2/FlipImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Flip an image",
            ),
            Operation::GetImageMetadata => spec(
                "get-image-metadata",
                "api/v2/GetImageMetadata",
                C::Image,
                I::Document,
                O::Json,
                "Read image metadata",
            ),
            Operation::ImageExtractText => spec(
                "image-extract-text",
                "api/v2/ImageExtractText",
                C::Image,
                I::Document,
                O::Json,
                "Extract text from an image with OCR",
            ),
            Operation::ReadBarcodesFromImage => spec(
                "read-barcodes-from-image",
                "api/v2/ReadBarcodesFromImage",
                C::Image,
                I::Document,
                O::Json,
                "Read barcodes from an image",
            ),
            Operation::RemoveExifTags => spec(
                "remove-exif-tags",
                "api/v2/RemoveExifTagsFromImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Strip EXIF tags from an image",
            ),
            Operation::ReplaceTextWithImage => spec(
                "replace-text-with-image",
                "api/v2/ReplaceTextWithImage",
                C::Image,
                I::Document,
                O::File("pdf"),
                "Replace text in a PDF with an image",
            ),
            Operation::ResizeImage => spec(
                "resize-image",
                "api/v2/ResizeImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Resize an image",
            ),
            Operation::RotateImage => spec(
                "rotate-image",
                "api/v2/RotateImage",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Rotate an image",
            ),
            Operation::RotateImageByExif => spec(
                "rotate-image-by-exif",
                "api/v2/RotateImageByExifData",
                C::Image,
                I::Document,
                O::SameAsInput,
                "Rotate an image according to its EXIF orientation",
            ),
            Operation::Merge => spec(
                "merge",
                "api/v2/Merge",
                C::MergeSplit,
                I::Documents,
                O::File("pdf"),
                "Merge several PDFs into one",
            ),
            Operation::MergeOverlay => spec(
                "merge-overlay",
                "api/v2/MergeOverlay",
                C::MergeSplit,
                I::Overlay,
                O::File("pdf"),
                "Overlay one PDF on top of another",
            ),
            Operation::SplitByBarcode => spec(
                "split-by-barcode",
                "api/v2/SplitPdfByBarcode_old",
                C::MergeSplit,
                I::Document,
                O::Envelope,
                "Split a PDF at barcode pages",
            ),
            Operation::SplitByText => spec(
                "split-by-text",
                "api/v2/SplitByText",
                C::MergeSplit,
                I::Document,
                O::Envelope,
                "Split a PDF at pages containing text",
            ),
            Operation::SplitPdf => spec(
                "split-pdf",
                "api/v2/SplitPdf",
                C::MergeSplit,
                I::Document,
                O::Envelope,
                "Split a PDF by pages or ranges",
            ),
            Operation::Compress => spec(
                "compress-pdf",
                "api/v2/Optimize",
                C::Optimize,
                I::Document,
                O::File("pdf"),
                "Compress and optimize a PDF",
            ),
            Operation::DeleteBlankPages => spec(
                "delete-blank-pages",
                "api/v2/DeleteBlankPages",
                C::Organize,
                I::Document,
                O::File("pdf"),
                "Remove blank pages",
            ),
            Operation::DeletePages => spec(
                "delete-pages",
                "api/v2/DeletePages",
                C::Organize,
                I::Document,
                O::File("pdf"),
                "Remove selected pages",
            ),
            Operation::ExtractPages => spec(
                "extract-pages",
                "api/v2/Extract",
                C::Organize,
                I::Document,
                O::File("pdf"),
                "Keep only selected pages",
            ),
            Operation::RotateDocument => spec(
                "rotate-document",
                "api/v2/Rotate",
                C::Organize,
                I::Document,
                O::File("pdf"),
                "Rotate every page",
            ),
            Operation::RotatePage => spec(
                "rotate-page",
                "api/v2/RotatePage",
                C::Organize,
                I::Document,
                O::File("pdf"),
                "Rotate selected pages",
            ),
            Operation::GetPdfMetadata => spec(
                "get-pdf-metadata",
                "api/v2/GetPdfMetadata",
                C::Pdf,
                I::Document,
                O::Json,
                "Read PDF metadata",
            ),
            Operation::RepairPdf => spec(
                "repair-pdf",
                "api/v2/RepairPdf",
                C::Pdf,
                I::Document,
                O::File("pdf"),
                "Repair a damaged PDF",
            ),
            Operation::Protect => spec(
                "protect",
                "api/v2/Protect",
                C::Security,
                I::Document,
                O::File("pdf"),
                "Password-protect a PDF",
            ),
            Operation::Unlock => spec(
                "unlock",
                "api/v2/Unlock",
                C::Security,
                I::Document,
                O::File("pdf"),
                "Remove password protection",
            ),
        }
    }

    /// CLI name, e.g. `split-pdf`
    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Path relative to the API base URL, e.g. `api/v2/SplitPdf`
    pub fn endpoint(&self) -> &'static str {
        self.spec().endpoint
    }

    pub fn category(&self) -> Category {
        self.spec().category
    }

    pub fn input(&self) -> InputKind {
        self.spec().input
    }

    pub fn output(&self) -> OutputKind {
        self.spec().output
    }

    /// Extension for the output file; `None` keeps the input's extension
    pub fn default_extension(&self) -> Option<&'static str> {
        match self.output() {
            OutputKind::File(ext) => Some(ext),
            OutputKind::Json | OutputKind::Envelope => Some("json"),
            OutputKind::SameAsInput => None,
        }
    }

    /// Look up an operation by CLI name, case-insensitively
    pub fn from_name(name: &str) -> Option<Operation> {
        let wanted = name.trim().to_ascii_lowercase().replace('_', "-");
        ALL.iter().copied().find(|op| op.name() == wanted)
    }

    /// All operations in a category
    pub fn in_category(category: Category) -> impl Iterator<Item = Operation> {
        ALL.iter().copied().filter(move |op| op.category() == category)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::from_name(s).ok_or_else(|| {
            CoreError::Validation(format!(
                "unknown operation '{}'; run `pdf4mectl operations` to list them",
                s
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_kebab_case() {
        let mut seen = HashSet::new();
        for op in Operation::all() {
            let name = op.name();
            assert!(seen.insert(name), "duplicate operation name {}", name);
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "{} is not kebab-case",
                name
            );
        }
    }

    #[test]
    fn test_endpoints_are_unique_and_versioned() {
        let mut seen = HashSet::new();
        for op in Operation::all() {
            let endpoint = op.endpoint();
            assert!(endpoint.starts_with("api/v2/"), "{}", endpoint);
            assert!(seen.insert(endpoint), "duplicate endpoint {}", endpoint);
        }
    }

    #[test]
    fn test_from_name_round_trip() {
        for op in Operation::all() {
            assert_eq!(Operation::from_name(op.name()), Some(*op));
        }
        assert_eq!(Operation::from_name("SPLIT_PDF"), Some(Operation::SplitPdf));
        assert_eq!(Operation::from_name("nope"), None);
    }

    #[test]
    fn test_from_str_unknown_is_validation_error() {
        let err = "frobnicate".parse::<Operation>().unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_known_endpoints() {
        assert_eq!(Operation::AddTextStamp.endpoint(), "api/v2/Stamp");
        assert_eq!(Operation::CreatePdfA.endpoint(), "api/v2/PdfA");
        assert_eq!(Operation::Compress.endpoint(), "api/v2/Optimize");
        assert_eq!(Operation::ConvertMarkdownToPdf.endpoint(), "api/v2/ConvertMdToPdf");
    }

    #[test]
    fn test_input_kinds() {
        assert_eq!(Operation::Merge.input(), InputKind::Documents);
        assert_eq!(Operation::MergeOverlay.input(), InputKind::Overlay);
        assert_eq!(Operation::CreateBarcode.input(), InputKind::None);
        assert_eq!(Operation::GenerateDocumentSingle.input(), InputKind::Template);
        assert_eq!(InputKind::Documents.arity(), (2, None));
        assert_eq!(InputKind::Overlay.arity(), (2, Some(2)));
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(Operation::ConvertPdfToWord.default_extension(), Some("docx"));
        assert_eq!(Operation::ReadBarcodes.default_extension(), Some("json"));
        assert_eq!(Operation::ResizeImage.default_extension(), None);
    }

    #[test]
    fn test_every_category_has_operations() {
        for category in [
            Category::Barcode,
            Category::Convert,
            Category::Edit,
            Category::Extract,
            Category::Forms,
            Category::Generate,
            Category::Image,
            Category::MergeSplit,
            Category::Optimize,
            Category::Organize,
            Category::Pdf,
            Category::Search,
            Category::Security,
            Category::Word,
        ] {
            assert!(
                Operation::in_category(category).next().is_some(),
                "no operations in {}",
                category
            );
        }
    }
}

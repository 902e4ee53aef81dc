use crate::domain::{Grain, GrainResult, GrainSpectrum};

pub trait GrainProcessor {
    fn process(&self, grain: Grain) -> GrainResult<GrainSpectrum>;
}

impl<T> GrainProcessor for &T
where
    T: GrainProcessor + ?Sized,
{
    fn process(&self, grain: Grain) -> GrainResult<GrainSpectrum> {
        (**self).process(grain)
    }
}

#[cfg(test)]
mod tests {
    use super::GrainProcessor;
    use crate::domain::{
        Grain, GrainError, GrainErrorCategory, GrainId, GrainResult, GrainSpectrum,
    };

    struct FailingProcessor;

    impl GrainProcessor for FailingProcessor {
        fn process(&self, grain: Grain) -> GrainResult<GrainSpectrum> {
            Err(GrainError::degenerate_trace(
                "DEGENERATE.TEST",
                format!("grain {} failed", grain.id),
            ))
        }
    }

    #[test]
    fn processor_uses_shared_error_types() {
        let grain = Grain::new(GrainId::new(4).unwrap(), Vec::new());
        let error = FailingProcessor
            .process(grain)
            .expect_err("processor should fail");
        assert_eq!(error.category(), GrainErrorCategory::DegenerateTrace);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.message(), "grain 4 failed");
    }

    #[test]
    fn references_forward_to_the_processor() {
        let processor = FailingProcessor;
        let by_ref = &processor;
        let grain = Grain::new(GrainId::new(1).unwrap(), Vec::new());
        assert!(by_ref.process(grain).is_err());
    }
}
